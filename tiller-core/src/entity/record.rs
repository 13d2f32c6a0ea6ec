use crate::{AsValue, Binding, Column, Error, Result, Table, Value};
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt::{self, Debug, Formatter},
    rc::{Rc, Weak},
};

/// Value held by one property of a record.
#[derive(Debug, Clone)]
pub enum Property {
    Value(Value),
    Entity(Record),
}

struct RecordState {
    entity: String,
    table: Option<Table>,
    properties: BTreeMap<String, Property>,
    changed: BTreeSet<String>,
    /// Column values established at load or attach time, `None` while detached.
    baseline: Option<BTreeMap<String, Value>>,
    parent: Option<Weak<RefCell<RecordState>>>,
}

/// Handle to a materialized entity.
///
/// Clones share the same state, equality compares values deeply.
#[derive(Clone)]
pub struct Record(Rc<RefCell<RecordState>>);

impl Record {
    pub fn new(entity: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(RecordState {
            entity: entity.into(),
            table: None,
            properties: BTreeMap::new(),
            changed: BTreeSet::new(),
            baseline: None,
            parent: None,
        })))
    }
    /// New, not yet attached, record of the entity stored in `table`.
    pub fn for_table(table: &Table) -> Self {
        let record = Self::new(table.entity());
        record.0.borrow_mut().table = Some(table.unaliased());
        record
    }
    pub fn entity_name(&self) -> String {
        self.0.borrow().entity.clone()
    }
    /// Table the record is stored in, or will be inserted into.
    pub fn table(&self) -> Option<Table> {
        self.0.borrow().table.clone()
    }
    pub fn is_attached(&self) -> bool {
        self.0.borrow().baseline.is_some()
    }
    /// Identity of the shared state.
    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
    pub fn property(&self, property: &str) -> Option<Property> {
        self.0.borrow().properties.get(property).cloned()
    }
    pub fn property_names(&self) -> Vec<String> {
        self.0.borrow().properties.keys().cloned().collect()
    }
    /// Raw value of a scalar property, `None` when absent.
    pub fn value(&self, property: &str) -> Option<Value> {
        match self.0.borrow().properties.get(property) {
            Some(Property::Value(v)) => Some(v.clone()),
            _ => None,
        }
    }
    /// Typed read, absent and null properties read as `T::default()`.
    pub fn get<T: AsValue + Default>(&self, property: &str) -> Result<T> {
        Ok(self.get_opt(property)?.unwrap_or_default())
    }
    pub fn get_opt<T: AsValue>(&self, property: &str) -> Result<Option<T>> {
        match self.property(property) {
            None => Ok(None),
            Some(Property::Value(v)) if v.is_null() => Ok(None),
            Some(Property::Value(v)) => T::try_from_value(v).map(Some),
            Some(Property::Entity(..)) => Err(Error::msg(format!(
                "Property `{}` of `{}` holds an entity, not a value",
                property,
                self.entity_name()
            ))),
        }
    }
    /// Tracked write.
    pub fn set(&self, property: &str, value: impl AsValue) {
        self.set_value(property, value.as_value());
    }
    pub fn set_value(&self, property: &str, value: Value) {
        let mut state = self.0.borrow_mut();
        state
            .properties
            .insert(property.into(), Property::Value(value));
        state.changed.insert(property.into());
    }
    pub fn set_null(&self, property: &str) {
        self.set_value(property, Value::Null);
    }
    /// Tracked write of an entity valued property.
    ///
    /// A detached record without parent becomes part of this record graph.
    pub fn set_entity(&self, property: &str, entity: &Record) {
        let adopt = !entity.is_attached()
            && entity.parent().is_none()
            && !self.ancestors().any(|r| r.ptr_eq(entity));
        if adopt {
            entity.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        }
        let mut state = self.0.borrow_mut();
        state
            .properties
            .insert(property.into(), Property::Entity(entity.clone()));
        state.changed.insert(property.into());
    }
    pub fn entity(&self, property: &str) -> Option<Record> {
        match self.0.borrow().properties.get(property) {
            Some(Property::Entity(v)) => Some(v.clone()),
            _ => None,
        }
    }
    /// Entity valued properties, in property order.
    pub fn entities(&self) -> Vec<(String, Record)> {
        self.0
            .borrow()
            .properties
            .iter()
            .filter_map(|(k, v)| match v {
                Property::Entity(e) => Some((k.clone(), e.clone())),
                _ => None,
            })
            .collect()
    }
    /// Nested record stored in `property`, created when missing.
    pub fn nested(&self, property: &str, entity: &str) -> Record {
        if let Some(record) = self.entity(property) {
            return record;
        }
        let record = Record::new(entity);
        record.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        self.put(property, Property::Entity(record.clone()));
        record
    }
    pub fn parent(&self) -> Option<Record> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Record)
    }
    /// This record followed by its parents.
    pub fn ancestors(&self) -> impl Iterator<Item = Record> {
        std::iter::successors(Some(self.clone()), Record::parent)
    }
    pub fn root(&self) -> Record {
        self.ancestors().last().unwrap_or_else(|| self.clone())
    }
    /// Whether `self` is stored on its own and not part of the graph rooted at `owner`.
    pub fn is_external_to(&self, owner: &Record) -> bool {
        self.is_attached() && !self.root().ptr_eq(owner)
    }
    /// Properties written since the last load, attach or flush.
    pub fn changed(&self) -> Vec<String> {
        self.0.borrow().changed.iter().cloned().collect()
    }
    pub fn is_dirty(&self) -> bool {
        !self.0.borrow().changed.is_empty()
    }
    pub fn baseline(&self, column: &str) -> Option<Value> {
        self.0
            .borrow()
            .baseline
            .as_ref()
            .and_then(|b| b.get(column).cloned())
    }
    /// Untracked write, used while materializing.
    pub(crate) fn put(&self, property: &str, value: Property) {
        self.0
            .borrow_mut()
            .properties
            .insert(property.into(), value);
    }
    /// Make `table` the storage of the record, its current values become the baseline.
    pub fn attach(&self, table: &Table) {
        {
            let mut state = self.0.borrow_mut();
            state.table = Some(table.unaliased());
        }
        self.commit();
    }
    pub(crate) fn detach(&self) {
        self.0.borrow_mut().baseline = None;
    }
    /// Advance the baseline to the current values and forget the changes of
    /// this record and of the internal records of its graph.
    pub(crate) fn commit(&self) {
        if let Some(table) = self.table() {
            let baseline = table
                .all_columns()
                .filter_map(|c| column_value(self, &c).map(|v| (c.name().to_string(), v)))
                .collect();
            self.0.borrow_mut().baseline = Some(baseline);
        }
        let mut visited = HashSet::from([self.id()]);
        let mut stack = vec![self.clone()];
        while let Some(record) = stack.pop() {
            record.0.borrow_mut().changed.clear();
            for (_, child) in record.entities() {
                if visited.insert(child.id()) && !child.is_external_to(self) {
                    stack.push(child);
                }
            }
        }
    }
}

/// Current value of the property `column` is bound to, `None` when not established.
///
/// Reference bindings resolve to the primary key of the referenced record. The
/// value is converted to the column type, so `5i32` and `5i64` read the same.
pub fn column_value(record: &Record, column: &Column) -> Option<Value> {
    let value = match column.binding()? {
        Binding::Property(property) => record.value(property)?,
        Binding::Nested { path, property } => {
            let mut current = record.clone();
            for step in path.iter() {
                current = current.entity(step.property)?;
            }
            current.value(property)?
        }
        Binding::Reference { property, table } => match record.property(property)? {
            Property::Value(v) => v,
            Property::Entity(referenced) => {
                let key = table().primary_key().ok()?;
                column_value(&referenced, &key)?
            }
        },
    };
    Some(column.codec().normalize(value))
}

/// Store `value` along a scalar binding, creating the intermediate nested records.
pub(crate) fn assign(record: &Record, binding: &Binding, value: Value) -> Result<()> {
    match binding {
        Binding::Property(property) => record.put(property, Property::Value(value)),
        Binding::Nested { path, property } => {
            let mut current = record.clone();
            for step in path.iter() {
                current = current.nested(step.property, step.entity);
            }
            current.put(property, Property::Value(value));
        }
        Binding::Reference { property, .. } => {
            return Err(Error::msg(format!(
                "Property `{}` is a reference and cannot hold a scalar",
                property
            )));
        }
    }
    Ok(())
}

fn is_empty_property(value: Option<&Property>) -> bool {
    match value {
        None => true,
        Some(Property::Value(v)) => v.is_null(),
        Some(Property::Entity(e)) => e.is_empty(),
    }
}

impl Record {
    /// No property holds a value, nested records included.
    pub fn is_empty(&self) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![self.clone()];
        while let Some(record) = stack.pop() {
            if !visited.insert(record.id()) {
                continue;
            }
            for value in record.0.borrow().properties.values() {
                match value {
                    Property::Value(v) if !v.is_null() => return false,
                    Property::Entity(e) => stack.push(e.clone()),
                    Property::Value(..) => {}
                }
            }
        }
        true
    }

    fn equal(&self, other: &Record, visited: &mut HashSet<(usize, usize)>) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if !visited.insert((self.id(), other.id())) {
            return true;
        }
        let (lhs, rhs) = (self.0.borrow(), other.0.borrow());
        if lhs.entity != rhs.entity {
            return false;
        }
        // Stored records compare their bound properties only
        let keys: BTreeSet<&str> = match lhs.table.as_ref().or(rhs.table.as_ref()) {
            Some(table) => table
                .all_columns()
                .filter_map(|c| c.binding().map(Binding::root))
                .collect(),
            None => lhs
                .properties
                .keys()
                .chain(rhs.properties.keys())
                .map(String::as_str)
                .collect(),
        };
        keys.into_iter().all(|key| {
            let (a, b) = (lhs.properties.get(key), rhs.properties.get(key));
            match (a, b) {
                (Some(Property::Value(a)), Some(Property::Value(b))) => a == b,
                (Some(Property::Entity(a)), Some(Property::Entity(b))) => a.equal(b, visited),
                _ => is_empty_property(a) && is_empty_property(b),
            }
        })
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other, &mut HashSet::new())
    }
}

impl Debug for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        let mut debug = f.debug_struct(&state.entity);
        for (name, value) in &state.properties {
            match value {
                Property::Value(v) => debug.field(name, v),
                Property::Entity(e) => debug.field(name, &format_args!("{}(..)", e.entity_name())),
            };
        }
        debug.finish()
    }
}
