pub mod descriptor;
pub mod info;
pub mod object;
