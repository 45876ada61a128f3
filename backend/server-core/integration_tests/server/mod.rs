mod lifecycle;
mod managed;
