pub mod curve;
pub mod modular_arithmetic;
