pub mod opportunity_dto;
