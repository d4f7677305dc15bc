use std::cell::RefCell;
use std::rc::Rc;

use uuid::Uuid;

use crate::container::Container;
use crate::planning::request::Request;

/// Completed request tree of one resolution call
#[derive(Debug, Clone)]
pub struct Plan {
    root_request: Rc<Request>,
}

impl Plan {
    pub fn new(root_request: Rc<Request>) -> Self {
        Self { root_request }
    }

    pub fn root_request(&self) -> &Rc<Request> {
        &self.root_request
    }
}

/// State of a single `get`/`get_all` call, handed to dynamic values,
/// factories, providers and activation hooks.
pub struct Context {
    id: Uuid,
    container: Container,
    plan: Plan,
    current_request: RefCell<Option<Rc<Request>>>,
}

impl Context {
    pub fn new(container: Container, plan: Plan) -> Self {
        Self {
            id: Uuid::new_v4(),
            container,
            plan,
            current_request: RefCell::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Container the resolution was started on
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Request the resolver is currently working on
    pub fn current_request(&self) -> Option<Rc<Request>> {
        self.current_request.borrow().clone()
    }

    pub(crate) fn set_current_request(&self, request: Rc<Request>) {
        *self.current_request.borrow_mut() = Some(request);
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("container", &self.container.id())
            .field("plan", &self.plan)
            .finish()
    }
}
