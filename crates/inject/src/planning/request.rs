use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use uuid::Uuid;

use crate::container::binding::{Binding, Instance};
use crate::container::identifier::ServiceIdentifier;
use crate::planning::target::Target;

/// Request-scoped instances of one resolution call, keyed by binding id
pub type RequestScope = Rc<RefCell<HashMap<Uuid, Instance>>>;

/// One node of a planned dependency tree.
///
/// Children are owned by their parent; the parent is referenced weakly, so
/// the tree is dropped with its root. The request scope is created by the
/// root and shared by every descendant.
pub struct Request {
    id: Uuid,
    service_identifier: ServiceIdentifier,
    parent_request: Option<Weak<Request>>,
    bindings: Vec<Arc<Binding>>,
    child_requests: RefCell<Vec<Rc<Request>>>,
    target: Target,
    request_scope: RequestScope,
}

impl Request {
    /// Create the root request of a plan along with a fresh request scope
    pub fn root(
        service_identifier: ServiceIdentifier,
        bindings: Vec<Arc<Binding>>,
        target: Target,
    ) -> Rc<Request> {
        Rc::new(Self::detached(service_identifier, None, bindings, target))
    }

    /// Create a request that points at `parent` without being registered as
    /// its child. Used to evaluate constraints against a single candidate.
    pub fn detached(
        service_identifier: ServiceIdentifier,
        parent: Option<&Rc<Request>>,
        bindings: Vec<Arc<Binding>>,
        target: Target,
    ) -> Request {
        let request_scope = match parent {
            Some(parent) => parent.request_scope.clone(),
            None => Rc::new(RefCell::new(HashMap::new())),
        };
        Request {
            id: Uuid::new_v4(),
            service_identifier,
            parent_request: parent.map(Rc::downgrade),
            bindings,
            child_requests: RefCell::new(Vec::new()),
            target,
            request_scope,
        }
    }

    /// Append a child request and return it
    pub fn add_child_request(
        self: &Rc<Self>,
        service_identifier: ServiceIdentifier,
        bindings: Vec<Arc<Binding>>,
        target: Target,
    ) -> Rc<Request> {
        let child = Rc::new(Self::detached(service_identifier, Some(self), bindings, target));
        self.child_requests.borrow_mut().push(child.clone());
        child
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn service_identifier(&self) -> &ServiceIdentifier {
        &self.service_identifier
    }

    pub fn parent_request(&self) -> Option<Rc<Request>> {
        self.parent_request.as_ref().and_then(Weak::upgrade)
    }

    pub fn bindings(&self) -> &[Arc<Binding>] {
        &self.bindings
    }

    pub fn child_requests(&self) -> Ref<'_, Vec<Rc<Request>>> {
        self.child_requests.borrow()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn request_scope(&self) -> &RequestScope {
        &self.request_scope
    }

    /// Number of ancestors above this request
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent_request();
        while let Some(parent) = current {
            depth += 1;
            current = parent.parent_request();
        }
        depth
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("service_identifier", &self.service_identifier)
            .field("bindings", &self.bindings.len())
            .field("children", &self.child_requests.borrow().len())
            .field("target", &self.target)
            .finish()
    }
}
