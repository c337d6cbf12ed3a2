pub mod api_error;
pub mod signature;
pub mod submit;
pub mod trade;
pub mod typed_data;
