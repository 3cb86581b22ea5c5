pub mod html;
pub mod printer;
