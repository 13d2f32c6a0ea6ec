use crate::{Table, Value};
use std::ops::{Deref, DerefMut};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlSelect,
    SqlSelectFrom,
    SqlSelectWhere,
    SqlSelectGroupBy,
    SqlSelectHaving,
    SqlSelectOrderBy,
    SqlJoin,
    SqlSubquery,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlInsertIntoOnConflict,
    SqlUpdate,
    SqlUpdateSet,
    SqlUpdateWhere,
    SqlDeleteFrom,
    SqlDeleteFromWhere,
    Casting,
}

/// Mutable state threaded through the rendering of one statement.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub fragment: Fragment,
    /// Table modified by the statement, declared without alias.
    pub target: Option<Table>,
    /// Write columns of `target` qualified by its name instead of bare.
    pub qualify_target: bool,
    /// Positional parameters, in placeholder order.
    pub params: Vec<Value>,
}

impl Context {
    pub fn new(fragment: Fragment) -> Self {
        Self {
            fragment,
            ..Default::default()
        }
    }
    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        let previous = self.fragment;
        self.fragment = fragment;
        ContextUpdater {
            previous,
            context: self,
        }
    }
}

/// Restores the previous fragment when dropped.
pub struct ContextUpdater<'a> {
    previous: Fragment,
    context: &'a mut Context,
}

impl<'a> Deref for ContextUpdater<'a> {
    type Target = Context;
    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl<'a> DerefMut for ContextUpdater<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl<'a> Drop for ContextUpdater<'a> {
    fn drop(&mut self) {
        self.context.fragment = self.previous;
    }
}
