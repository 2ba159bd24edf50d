mod portal_dto;

pub use portal_dto::*;
