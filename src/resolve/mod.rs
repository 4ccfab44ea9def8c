//! Placeholder resolution for variables, task prompts, and output templates.
//!
//! Text may reference variables with `{name}` placeholders. A variable's own
//! value may contain further placeholders, which are expanded recursively.
//! Run-time values such as `RESPONSE` are supplied through a [`Context`] and
//! are substituted verbatim.
//!
//! # Lookup order
//!
//! 1. Context value (never re-scanned)
//! 2. Variable value (recursively resolved)
//! 3. Unknown names are left untouched
//!
//! ```
//! use promptbatch::resolve::{Resolver, response_context};
//!
//! let resolver = Resolver::new([("GREETING", "Hello {WHO}"), ("WHO", "world")]);
//! assert_eq!(resolver.resolve("{GREETING}!").unwrap(), "Hello world!");
//!
//! let ctx = response_context("{WHO}");
//! assert_eq!(resolver.resolve_with_context("> {RESPONSE}", &ctx).unwrap(), "> {WHO}");
//! ```

mod resolver;

pub use resolver::{
    Context, RESERVED_NAMES, RESPONSE, ResolveError, Resolver, is_reserved, placeholders,
    response_context,
};
