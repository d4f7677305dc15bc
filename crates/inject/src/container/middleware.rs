use std::fmt;
use std::sync::Arc;

use crate::container::identifier::ServiceIdentifier;
use crate::container::Container;
use crate::errors::Result;
use crate::planning::context::Context;
use crate::planning::metadata::Tag;
use crate::planning::planner::PlanOptions;
use crate::planning::target::TargetType;
use crate::resolution::resolved::Resolved;

/// Hook receiving the planned context before it is resolved
pub type ContextInterceptor = Arc<dyn Fn(Context) -> Context + Send + Sync>;

/// One step of the resolution pipeline.
///
/// Returning `Ok(None)` is a misconfiguration and is reported as
/// `InvalidMiddlewareReturn`.
pub type Next = Arc<dyn Fn(&Container, NextArgs) -> Result<Option<Resolved>> + Send + Sync>;

/// Wraps the next step of the pipeline
pub type Middleware = Arc<dyn Fn(Next) -> Next + Send + Sync>;

/// Arguments flowing through the middleware chain
#[derive(Clone)]
pub struct NextArgs {
    pub avoid_constraints: bool,
    pub is_multi_inject: bool,
    pub target_type: TargetType,
    pub service_identifier: ServiceIdentifier,
    pub tag: Option<Tag>,
    pub context_interceptor: ContextInterceptor,
}

impl NextArgs {
    pub fn new(service_identifier: ServiceIdentifier) -> Self {
        Self {
            avoid_constraints: false,
            is_multi_inject: false,
            target_type: TargetType::Variable,
            service_identifier,
            tag: None,
            context_interceptor: Arc::new(|context: Context| context),
        }
    }

    pub(crate) fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            is_multi_inject: self.is_multi_inject,
            target_type: self.target_type,
            service_identifier: self.service_identifier.clone(),
            tag: self.tag.clone(),
            avoid_constraints: self.avoid_constraints,
        }
    }
}

impl fmt::Debug for NextArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextArgs")
            .field("avoid_constraints", &self.avoid_constraints)
            .field("is_multi_inject", &self.is_multi_inject)
            .field("target_type", &self.target_type)
            .field("service_identifier", &self.service_identifier)
            .field("tag", &self.tag)
            .finish()
    }
}

/// Wrap `initial` with each middleware in order; the last one sees
/// requests first
pub fn compose(initial: Next, middlewares: impl IntoIterator<Item = Middleware>) -> Next {
    middlewares
        .into_iter()
        .fold(initial, |next, middleware| middleware(next))
}

/// Build a middleware from a closure receiving the container, the
/// arguments and the next step
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(&Container, NextArgs, &Next) -> Result<Option<Resolved>> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: Next| {
        let f = f.clone();
        Arc::new(move |container: &Container, args: NextArgs| f(container, args, &next)) as Next
    })
}
