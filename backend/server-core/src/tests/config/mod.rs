mod app_config;
mod providers;
