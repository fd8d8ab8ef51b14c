//! Headless screens and the navigation stack that drives them
//!
//! Screens hold state and turn user intents into `ScreenAction`s; whoever
//! owns the navigator decides how to present the result.

use async_trait::async_trait;

use crate::models::{Resource, ResourceItem};

pub mod detail;
pub mod list;

pub use detail::DetailScreen;
pub use list::{ListIntent, ListScreen};

/// Where the navigator can go
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    List(Resource),
    /// `item` is `None` when creating a new item
    Detail {
        resource: Resource,
        item: Option<ResourceItem>,
    },
}

impl Route {
    pub fn resource(&self) -> Resource {
        match self {
            Route::List(resource) => *resource,
            Route::Detail { resource, .. } => *resource,
        }
    }
}

/// Actions that can be returned from screen event handling
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    NavigateTo(Route),
    NavigateBack,
    Quit,
    SetStatus(String),
    SetError(String),
    None,
}

/// Core trait for all screens
pub trait Screen {
    fn route(&self) -> Route;

    fn title(&self) -> String;

    /// Called when the screen becomes the top of the stack again
    async fn on_focus(&mut self) -> ScreenAction {
        ScreenAction::None
    }

    /// Called when another screen is pushed on top
    fn on_blur(&mut self) {}
}

/// Asks the user to confirm a destructive action
#[async_trait]
pub trait Confirm: Send {
    async fn confirm(&mut self, title: &str, message: &str) -> bool;
}

/// Confirms everything, for non-interactive use
pub struct AssumeYes;

#[async_trait]
impl Confirm for AssumeYes {
    async fn confirm(&mut self, _title: &str, _message: &str) -> bool {
        true
    }
}

/// Stack of routes; the last entry is the focused screen
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Navigator {
    pub fn new(root: Route) -> Self {
        Self { stack: vec![root] }
    }

    pub fn current(&self) -> &Route {
        // the root is never popped
        &self.stack[self.stack.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    pub fn push(&mut self, route: Route) -> &Route {
        self.stack.push(route);
        self.current()
    }

    /// Pop the focused screen; returns the route that regained focus
    pub fn back(&mut self) -> Option<&Route> {
        if !self.can_go_back() {
            return None;
        }
        self.stack.pop();
        Some(self.current())
    }
}
