//! # Cart State
//!
//! Holds the live sale: the cart and the discount mode that applies to it.
//!
//! ## Thread Safety
//! The session is wrapped in `Arc<Mutex<T>>` because:
//! 1. The scanner task and the command loop both add to the cart
//! 2. Only one mutation should run at a time
//! 3. Mutations are synchronous; the lock is never held across an `.await`
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Input                      Command                 Session Change      │
//! │  ─────                      ───────                 ──────────────      │
//! │                                                                         │
//! │  Scanner burst ───────────► scan_code() ──────────► line added / +1    │
//! │                                                                         │
//! │  Typed codes ─────────────► submit_manual_entry() ► lines added / +1   │
//! │                                                                         │
//! │  "/qty <line> <n>" ───────► update_quantity() ────► qty = n / removed  │
//! │                                                                         │
//! │  "/toggle <line>" ────────► toggle_line_discount()► toggle flipped     │
//! │                                                                         │
//! │  "/discount 10%" ─────────► set_manual_discount() ► mode = Manual      │
//! │                                                                         │
//! │  "/save" / checkout ──────► save_draft() ─────────► reset              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tally_core::{Cart, DiscountMode};

/// The sale being rung up.
#[derive(Debug, Clone)]
pub struct CartSession {
    pub cart: Cart,
    pub discount_mode: DiscountMode,
}

impl CartSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        CartSession {
            cart: Cart::new(now),
            discount_mode: DiscountMode::Auto,
        }
    }

    /// Empties the cart and returns to auto discounts.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.cart.reset(now);
        self.discount_mode = DiscountMode::Auto;
    }
}

/// Shared cart state.
///
/// ## Poisoning
/// A panic while the lock is held leaves the session as the panicking
/// closure left it; the next caller recovers the guard instead of failing.
#[derive(Debug, Clone)]
pub struct CartState {
    session: Arc<Mutex<CartSession>>,
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        CartState {
            session: Arc::new(Mutex::new(CartSession::new(Utc::now()))),
        }
    }

    /// Executes a function with read access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let lines = cart_state.with_session(|s| s.cart.len());
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CartSession) -> R,
    {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    /// Executes a function with write access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_session_mut(|s| s.cart.set_quantity(&line_id, 2))?;
    /// ```
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CartSession) -> R,
    {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{DiscountValue, ManualDiscount};

    #[test]
    fn test_reset_returns_to_auto() {
        let state = CartState::new();
        state.with_session_mut(|s| {
            s.discount_mode = DiscountMode::Manual {
                discount: ManualDiscount::new(DiscountValue::fixed_cents(100)),
            };
            s.reset(Utc::now());
        });

        state.with_session(|s| {
            assert!(s.cart.is_empty());
            assert_eq!(s.discount_mode, DiscountMode::Auto);
        });
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let state = CartState::new();
        let clone = state.clone();

        let _ = std::thread::spawn(move || {
            clone.with_session_mut(|_| panic!("boom"));
        })
        .join();

        assert!(state.with_session(|s| s.cart.is_empty()));
    }
}
