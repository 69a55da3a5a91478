//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod definition_mapping;
pub mod miqaat;
pub mod payment_definition;
pub mod payment_mapping;
pub mod position_mapping;
pub mod sharaf;
pub mod sharaf_clearance;
pub mod sharaf_definition;
pub mod sharaf_member;
pub mod sharaf_payment;
pub mod sharaf_position;
pub mod shift_audit;

// Re-export specific types to avoid conflicts
pub use definition_mapping::{
    Column as DefinitionMappingColumn, Entity as DefinitionMapping,
    Model as DefinitionMappingModel,
};
pub use miqaat::{Column as MiqaatColumn, Entity as Miqaat, Model as MiqaatModel};
pub use payment_definition::{
    Column as PaymentDefinitionColumn, Entity as PaymentDefinition,
    Model as PaymentDefinitionModel,
};
pub use payment_mapping::{
    Column as PaymentMappingColumn, Entity as PaymentMapping, Model as PaymentMappingModel,
};
pub use position_mapping::{
    Column as PositionMappingColumn, Entity as PositionMapping, Model as PositionMappingModel,
};
pub use sharaf::{Column as SharafColumn, Entity as Sharaf, Model as SharafModel, SharafStatus};
pub use sharaf_clearance::{
    Column as SharafClearanceColumn, Entity as SharafClearance, Model as SharafClearanceModel,
};
pub use sharaf_definition::{
    Column as SharafDefinitionColumn, Entity as SharafDefinition, Model as SharafDefinitionModel,
};
pub use sharaf_member::{
    Column as SharafMemberColumn, Entity as SharafMember, Model as SharafMemberModel,
};
pub use sharaf_payment::{
    Column as SharafPaymentColumn, Entity as SharafPayment, Model as SharafPaymentModel,
};
pub use sharaf_position::{
    Column as SharafPositionColumn, Entity as SharafPosition, Model as SharafPositionModel,
};
pub use shift_audit::{Column as ShiftAuditColumn, Entity as ShiftAudit, Model as ShiftAuditModel};
