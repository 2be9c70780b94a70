//! Lazy component types.
//!
//! A [`Lazy`] wraps a loader producing a future of the real element type.
//! The loader runs on first access; after that every visit samples the same
//! shared resource once, without blocking:
//!
//! - settled with a type: the element renders through that type in the same call
//! - still pending: the visit defers the node to the caller's queue
//! - settled with an error: the visit fails with `ResourceRejected`
//!
//! The caller awaits the [`LazyResource`] carried by the deferred work item.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture, Shared};
use futures::FutureExt;

use crate::element::ElementType;

/// Shared handle to a pending lazy resource. Clone it to await it.
pub type LazyResource = Shared<LocalBoxFuture<'static, Result<ElementType, Rc<str>>>>;

type Loader = Box<dyn FnOnce() -> LocalBoxFuture<'static, Result<ElementType, Rc<str>>>>;

/// Settlement state observed by one sample.
#[derive(Clone)]
pub enum LazyStatus {
    Pending(LazyResource),
    Resolved(ElementType),
    Rejected(Rc<str>),
}

impl fmt::Debug for LazyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyStatus::Pending(_) => f.write_str("Pending"),
            LazyStatus::Resolved(ty) => f.debug_tuple("Resolved").field(ty).finish(),
            LazyStatus::Rejected(reason) => f.debug_tuple("Rejected").field(reason).finish(),
        }
    }
}

struct LazyInner {
    loader: RefCell<Option<Loader>>,
    resource: RefCell<Option<LazyResource>>,
}

/// Element type resolved from an asynchronous resource.
#[derive(Clone)]
pub struct Lazy {
    inner: Rc<LazyInner>,
}

impl Lazy {
    /// Create a lazy type from a loader. The loader runs on first sample.
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<ElementType, String>> + 'static,
    {
        let loader: Loader = Box::new(move || {
            let fut = loader();
            async move { fut.await.map_err(Rc::<str>::from) }.boxed_local()
        });
        Self {
            inner: Rc::new(LazyInner {
                loader: RefCell::new(Some(loader)),
                resource: RefCell::new(None),
            }),
        }
    }

    /// Lazy type whose resource is already settled.
    pub fn resolved(ty: impl Into<ElementType>) -> Self {
        let ty = ty.into();
        Self::new(move || future::ready(Ok(ty)))
    }

    /// The shared resource, running the loader on first access.
    pub fn resource(&self) -> LazyResource {
        if let Some(resource) = self.inner.resource.borrow().as_ref() {
            return resource.clone();
        }
        let loader = self.inner.loader.borrow_mut().take();
        let resource = match loader {
            Some(loader) => loader().shared(),
            // Only reachable if a loader panicked mid-call.
            None => future::ready(Err(Rc::from("lazy loader unavailable")))
                .boxed_local()
                .shared(),
        };
        *self.inner.resource.borrow_mut() = Some(resource.clone());
        resource
    }

    /// Sample the settlement state once without blocking.
    pub fn status(&self) -> LazyStatus {
        let resource = self.resource();
        match resource.clone().now_or_never() {
            Some(Ok(ty)) => LazyStatus::Resolved(ty),
            Some(Err(reason)) => LazyStatus::Rejected(reason),
            None => LazyStatus::Pending(resource),
        }
    }
}

impl PartialEq for Lazy {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let started = self.inner.resource.borrow().is_some();
        f.debug_struct("Lazy").field("started", &started).finish()
    }
}
