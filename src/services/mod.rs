// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod export;
pub mod identity;
pub mod logs;
pub mod session;
pub mod subscription;
pub mod users;
pub mod week;

pub use identity::{FirebaseIdentity, IdentityProvider, MemoryIdentity, Principal};
pub use logs::LogRepository;
pub use session::{Session, SessionStore, SignUp};
pub use subscription::Subscription;
pub use users::UserRepository;
