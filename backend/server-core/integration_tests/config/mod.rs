mod layered;
mod load;
