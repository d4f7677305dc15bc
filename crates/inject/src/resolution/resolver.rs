use std::rc::Rc;
use std::sync::Arc;

use tracing::trace;

use crate::container::binding::{Binding, BindingKind, Instance};
use crate::errors::{InjectError, Result};
use crate::planning::context::Context;
use crate::planning::injectable::Newable;
use crate::planning::request::Request;
use crate::planning::target::TargetType;
use crate::resolution::arguments::Arguments;
use crate::resolution::resolved::Resolved;

/// Produce the value(s) described by the context's plan
pub fn resolve(context: &Context) -> Result<Resolved> {
    let root = context.plan().root_request().clone();
    resolve_request(context, &root)
}

fn resolve_request(context: &Context, request: &Rc<Request>) -> Result<Resolved> {
    context.set_current_request(request.clone());

    let target = request.target();
    let parent_is_same_array = request
        .parent_request()
        .map(|parent| parent.target().matches_array(target.service_identifier()))
        .unwrap_or(false);

    if target.is_array() && !parent_is_same_array {
        let children: Vec<Rc<Request>> = request.child_requests().clone();
        let mut instances = Vec::with_capacity(children.len());
        for child in &children {
            instances.extend(resolve_request(context, child)?.into_instances());
        }
        return Ok(Resolved::Many(instances));
    }

    match request.bindings().first() {
        Some(binding) => resolve_binding(context, request, binding).map(Resolved::Value),
        None if target.is_optional() => Ok(Resolved::Missing),
        None => {
            let service = request.service_identifier().to_string();
            Err(InjectError::NotRegistered {
                details: format!(" {}", service),
                service,
            })
        }
    }
}

fn resolve_binding(context: &Context, request: &Rc<Request>, binding: &Arc<Binding>) -> Result<Instance> {
    let scope = binding.scope();

    if scope.is_singleton() {
        if let Some(cached) = binding.cached() {
            return Ok(cached);
        }
    }
    if scope.is_request() {
        if let Some(cached) = request.request_scope().borrow().get(&binding.id()).cloned() {
            return Ok(cached);
        }
    }

    let kind = binding.kind();
    trace!(
        service = %binding.service_identifier(),
        scope = %scope,
        kind = kind.name(),
        "resolving binding"
    );

    let mut result = match kind {
        BindingKind::ConstantValue(value) => {
            binding.mark_activated();
            value
        }
        BindingKind::Function(function) => function,
        BindingKind::Constructor(newable) => Arc::new(newable) as Instance,
        BindingKind::DynamicValue(dynamic_value) => dynamic_value(context)?,
        BindingKind::Factory(factory) => factory(context)?,
        BindingKind::Provider(provider) => Arc::new(provider(context)?) as Instance,
        BindingKind::Instance(newable) => resolve_instance(context, request, &newable)?,
        BindingKind::Invalid => {
            return Err(InjectError::InvalidBindingType {
                service: binding.service_identifier().to_string(),
            })
        }
    };

    if let Some(on_activation) = binding.on_activation() {
        result = on_activation(context, result)?;
    }

    if scope.is_singleton() {
        result = binding.cache_singleton(result);
    }
    if scope.is_request() {
        request
            .request_scope()
            .borrow_mut()
            .entry(binding.id())
            .or_insert_with(|| result.clone());
    }

    Ok(result)
}

/// Resolve dependencies first, then construct and inject properties
fn resolve_instance(context: &Context, request: &Rc<Request>, newable: &Newable) -> Result<Instance> {
    let children: Vec<Rc<Request>> = request.child_requests().clone();
    let mut arguments = Vec::new();
    let mut properties = Vec::new();

    for child in &children {
        let resolved = resolve_request(context, child)?;
        match child.target().target_type() {
            TargetType::ConstructorArgument => arguments.push(resolved),
            TargetType::ClassProperty => properties.push((child.target().name().to_string(), resolved)),
            TargetType::Variable => {}
        }
    }

    context.set_current_request(request.clone());
    newable.instantiate(Arguments::new(newable.name(), arguments), properties)
}
