pub mod arena;
pub mod edit;
pub mod entity;
pub mod error;
pub mod lru;
pub mod tags;
pub mod tree;

pub use arena::{ChangeCallback, ChangeKind, EntityArena, EntityChange, PrefixOp};
pub use edit::{EditController, EditSession, EditState, FieldKind, validate_field};
pub use entity::{EntityField, TagCategory, WebEntity};
pub use error::{CoreError, Result};
pub use tags::TagOp;
pub use tree::{ContentTree, TreeRow};

pub fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║              c u r a t o r                   ║
    ║        web entity curation, inline           ║
    ╚══════════════════════════════════════════════╝
    "#
    );
}
