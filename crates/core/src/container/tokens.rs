//! Service tokens
//!
//! A [`Token`] is the key a binding is registered under and resolved by. Three
//! kinds of token exist:
//!
//! - **type tokens** identify a Rust type and compare by `TypeId`
//! - **name tokens** are plain strings and compare by value
//! - **symbol tokens** are unique: two symbols are only equal if one is a clone
//!   of the other, even when their descriptions match
//!
//! ## Usage
//!
//! ```rust
//! use locus_core::container::{ServiceToken, Token};
//! use locus_core::Service;
//!
//! #[derive(Default)]
//! struct SmtpMailer;
//! impl Service for SmtpMailer {}
//!
//! struct MailerToken;
//! impl ServiceToken for MailerToken {
//!     type Service = SmtpMailer;
//! }
//!
//! assert_eq!(Token::of::<SmtpMailer>(), Token::of::<SmtpMailer>());
//! assert_eq!(Token::named("mailer"), Token::from("mailer"));
//! assert_ne!(Token::symbol("mailer"), Token::symbol("mailer"));
//! assert_ne!(Token::token::<MailerToken>(), Token::of::<SmtpMailer>());
//! ```

use crate::foundation::traits::Service;
use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

/// Trait for zero-sized marker types that stand in for a service
///
/// Resolving through a service token gives back the associated `Service` type,
/// so call sites depend on the token rather than on the registration.
pub trait ServiceToken: Send + Sync + 'static {
    /// The service type this token resolves to
    type Service: Service;

    /// Get the token type name
    ///
    /// Used for debugging and error messages.
    fn token_type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A unique token with a human readable description
#[derive(Clone)]
pub struct Symbol {
    id: Uuid,
    description: Arc<str>,
}

impl Symbol {
    /// Create a new symbol; every call yields a distinct identity
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/// Service identifier used as binding key
#[derive(Clone)]
pub enum Token {
    /// A Rust type (service class or service token marker)
    Type {
        type_id: TypeId,
        type_name: &'static str,
    },
    /// A string identifier
    Name(Cow<'static, str>),
    /// A unique symbol
    Symbol(Symbol),
}

impl Token {
    /// Token for a type
    pub fn of<T: ?Sized + 'static>() -> Self {
        Token::Type {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Token for a service token marker type
    pub fn token<K: ServiceToken>() -> Self {
        Token::Type {
            type_id: TypeId::of::<K>(),
            type_name: K::token_type_name(),
        }
    }

    /// Token for a string identifier
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Token::Name(name.into())
    }

    /// A fresh symbol token
    pub fn symbol(description: impl Into<Arc<str>>) -> Self {
        Token::Symbol(Symbol::new(description))
    }

    /// Check if this token identifies the type `T`
    pub fn is_type<T: ?Sized + 'static>(&self) -> bool {
        matches!(self, Token::Type { type_id, .. } if *type_id == TypeId::of::<T>())
    }

    /// Human readable form used in diagnostics
    pub fn describe(&self) -> Cow<'_, str> {
        match self {
            Token::Type { type_name, .. } => Cow::Borrowed(short_type_name(type_name)),
            Token::Name(name) => Cow::Borrowed(name),
            Token::Symbol(symbol) => Cow::Owned(format!("Symbol({})", symbol.description)),
        }
    }
}

/// Strip the module path from a type name, keeping generic arguments intact
fn short_type_name(type_name: &'static str) -> &'static str {
    let head = type_name.split('<').next().unwrap_or(type_name);
    match head.rfind("::") {
        Some(index) => &type_name[index + 2..],
        None => type_name,
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Type { type_id: a, .. }, Token::Type { type_id: b, .. }) => a == b,
            (Token::Name(a), Token::Name(b)) => a == b,
            (Token::Symbol(a), Token::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Token::Type { type_id, .. } => type_id.hash(state),
            Token::Name(name) => name.hash(state),
            Token::Symbol(symbol) => symbol.hash(state),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type { type_name, .. } => write!(f, "Type({})", type_name),
            Token::Name(name) => write!(f, "Name({:?})", name),
            Token::Symbol(symbol) => write!(f, "{:?}", symbol),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<&'static str> for Token {
    fn from(name: &'static str) -> Self {
        Token::Name(Cow::Borrowed(name))
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::Name(Cow::Owned(name))
    }
}

impl From<Symbol> for Token {
    fn from(symbol: Symbol) -> Self {
        Token::Symbol(symbol)
    }
}

impl From<&Token> for Token {
    fn from(token: &Token) -> Self {
        token.clone()
    }
}
