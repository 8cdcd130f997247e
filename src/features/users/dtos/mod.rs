mod user_dto;

pub use user_dto::{SetBanDto, SetRoleDto, UserResponseDto};
