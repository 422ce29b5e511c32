/// Type-state markers for the builder pattern
///
/// These types are used to track which fields have been set
/// in the builder at compile-time, preventing invalid configurations.

use std::marker::PhantomData;

/// Marker trait for endpoint state
pub trait EndpointState {}

/// Endpoint has not been set
pub struct NoEndpoint;
impl EndpointState for NoEndpoint {}

/// Endpoint has been set
pub struct HasEndpoint;
impl EndpointState for HasEndpoint {}

/// Marker trait for state-store state
pub trait StoresState {}

/// Stores have not been set
pub struct NoStores;
impl StoresState for NoStores {}

/// Stores have been set
pub struct HasStores;
impl StoresState for HasStores {}

/// Phantom marker to prevent direct construction
#[derive(Debug, Clone, Copy)]
pub struct TypeState<E, S> {
    _endpoint: PhantomData<E>,
    _stores: PhantomData<S>,
}

impl<E, S> TypeState<E, S> {
    pub(crate) fn new() -> Self {
        Self {
            _endpoint: PhantomData,
            _stores: PhantomData,
        }
    }
}
