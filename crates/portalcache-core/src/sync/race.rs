//! First-then-authoritative combinator.
//!
//! Runs a fast provisional source (the local cache) against a slow
//! authoritative one (the server). Whatever the cache produces is published
//! early; the server's answer supersedes it.

use std::future::Future;

use tokio::sync::mpsc;

/// A value published while a race is running
#[derive(Debug, Clone, PartialEq)]
pub enum Update<T> {
    /// Cached value, possibly stale
    Provisional(T),
    /// Fresh value from the server; nothing follows it
    Final(T),
}

impl<T> Update<T> {
    pub fn value(&self) -> &T {
        match self {
            Update::Provisional(value) | Update::Final(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Update::Provisional(value) | Update::Final(value) => value,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Update::Final(_))
    }
}

/// How a race ended
#[derive(Debug)]
pub enum Outcome<T, E> {
    /// The authoritative source answered
    Fresh(T),
    /// The authoritative source failed after a provisional value was
    /// published; that value stands
    Stale { value: T, error: E },
    /// The update receiver was dropped
    Cancelled,
}

impl<T, E> Outcome<T, E> {
    /// The value the caller ends up with, if any
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Fresh(value) | Outcome::Stale { value, .. } => Some(value),
            Outcome::Cancelled => None,
        }
    }
}

/// Race `provisional` against `authoritative`, publishing to `updates`.
///
/// - `provisional` finishing first with `Some` publishes `Update::Provisional`.
/// - `authoritative` succeeding publishes `Update::Final`; a still pending
///   `provisional` is dropped and never published.
/// - `authoritative` failing yields `Outcome::Stale` when a provisional value
///   went out, otherwise the error.
/// - Dropping the receiver stops the race; both futures are dropped.
///
/// `updates` needs room for two values or the race stalls on a slow reader.
pub async fn first_then_authoritative<T, E, P, A>(
    provisional: P,
    authoritative: A,
    updates: &mpsc::Sender<Update<T>>,
) -> Result<Outcome<T, E>, E>
where
    T: Clone,
    P: Future<Output = Option<T>>,
    A: Future<Output = Result<T, E>>,
{
    tokio::pin!(provisional);
    tokio::pin!(authoritative);

    let mut published: Option<T> = None;
    let mut provisional_done = false;

    loop {
        tokio::select! {
            biased;

            _ = updates.closed() => return Ok(Outcome::Cancelled),

            result = &mut authoritative => {
                return match (result, published) {
                    (Ok(value), _) => {
                        if updates.send(Update::Final(value.clone())).await.is_err() {
                            return Ok(Outcome::Cancelled);
                        }
                        Ok(Outcome::Fresh(value))
                    }
                    (Err(error), Some(value)) => Ok(Outcome::Stale { value, error }),
                    (Err(error), None) => Err(error),
                };
            }

            cached = &mut provisional, if !provisional_done => {
                provisional_done = true;
                if let Some(value) = cached {
                    if updates.send(Update::Provisional(value.clone())).await.is_err() {
                        return Ok(Outcome::Cancelled);
                    }
                    published = Some(value);
                }
            }
        }
    }
}
