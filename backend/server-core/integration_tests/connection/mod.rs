mod factory;
