pub mod point_separator;
