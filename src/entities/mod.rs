pub mod document;
pub mod document_field;
pub mod document_signature;
pub mod signature;
pub mod site;
pub mod work_order;
pub mod work_order_photo;
pub mod worker;

pub use document::DocumentStatus;
pub use document_field::FieldKind;
pub use work_order::WorkOrderStatus;
