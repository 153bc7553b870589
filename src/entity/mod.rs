pub mod audit_logs;
pub mod cart_items;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod payment_methods;
pub mod payment_references;
pub mod product_tags;
pub mod product_variants;
pub mod products;
pub mod tags;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payment_methods::Entity as PaymentMethods;
pub use payment_references::Entity as PaymentReferences;
pub use product_tags::Entity as ProductTags;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use tags::Entity as Tags;
pub use users::Entity as Users;
