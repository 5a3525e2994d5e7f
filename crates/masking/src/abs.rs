//! Abstract data types.

/// Interface to peek a reference to the inner secret without consuming it.
/// Peeked values must never be logged or serialized wholesale.
pub trait PeekInterface<S> {
    /// Expose a reference to the inner secret
    fn peek(&self) -> &S;

    /// Expose a mutable reference to the inner secret
    fn peek_mut(&mut self) -> &mut S;
}

/// Interface that consumes the wrapper and returns the inner secret.
pub trait ExposeInterface<S> {
    /// Consume the secret and return the inner value
    fn expose(self) -> S;
}

/// Interface that consumes an optional wrapper and returns the inner value
/// or its default.
pub trait ExposeOptionInterface<S> {
    /// Expose the optional secret, falling back to the default value
    fn expose_option(self) -> S;
}

impl<S, I> ExposeInterface<S> for crate::Secret<S, I>
where
    I: crate::Strategy<S>,
{
    fn expose(self) -> S {
        self.inner_secret
    }
}

impl<S, I> ExposeOptionInterface<S> for Option<crate::Secret<S, I>>
where
    S: Default,
    I: crate::Strategy<S>,
{
    fn expose_option(self) -> S {
        self.map(ExposeInterface::expose).unwrap_or_default()
    }
}
