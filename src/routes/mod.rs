/// Router Module Index
///
/// Splits the routes by access level. Authentication is applied as a layer on
/// the whole `authenticated` router, so no protected endpoint can be mounted
/// without the gate.

/// Routes accessible to anonymous clients: banner, health and login.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
pub mod authenticated;
