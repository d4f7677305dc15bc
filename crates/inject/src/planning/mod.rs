pub mod context;
pub mod injectable;
pub mod metadata;
pub mod metadata_reader;
pub mod planner;
pub mod reflection;
pub mod request;
pub mod serialization;
pub mod target;

pub use context::{Context, Plan};
pub use injectable::{Injectable, Newable, Param, TypeMetadata, TypeMetadataBuilder};
pub use metadata::{Tag, TagKey, TagValue};
pub use metadata_reader::{ConstructorMetadata, MetadataReader, TypeRegistry};
pub use planner::{plan, PlanOptions};
pub use request::{Request, RequestScope};
pub use target::{Target, TargetType};
