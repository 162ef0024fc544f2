//! Runtime reflection surface over domain objects.

use crate::core::value::Value;
use crate::schema::descriptor::TypeDescriptor;
use uuid::Uuid;

/// The value of one property, as observed on a live object.
pub enum PropertyValue<'a> {
    Scalar(Value),
    Link(Option<&'a dyn SchemaObject>),
    MultiLink(Vec<&'a dyn SchemaObject>),
}

/// A domain object the query generator can reflect over.
///
/// Implementations are normally generated alongside the static
/// [`TypeDescriptor`] table; the trait only exposes what the generator
/// needs: the descriptor, property values by source name, and the tracked
/// server-assigned id for objects that were materialized from the database.
pub trait SchemaObject {
    fn descriptor(&self) -> &'static TypeDescriptor;

    fn property(&self, source_name: &str) -> Option<PropertyValue<'_>>;

    /// `Some` only when the object carries an id assigned by the server,
    /// i.e. it was returned by a query rather than constructed locally.
    fn object_id(&self) -> Option<Uuid> {
        None
    }
}

/// A stable identity token for an object reference.
///
/// Taken from the data pointer at the moment the reference enters the
/// builder; two tokens compare equal iff they denote the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId(usize);

pub fn ref_id(obj: &dyn SchemaObject) -> RefId {
    RefId(obj as *const dyn SchemaObject as *const () as usize)
}
