pub mod age;
pub mod breakdown;
pub mod hours;
pub mod range;
