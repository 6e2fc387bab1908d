pub mod customer;
pub mod faq;
pub mod session;
