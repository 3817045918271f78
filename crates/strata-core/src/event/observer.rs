// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;

/// Identifies a subscription inside an [`ObserverList`].
///
/// Returned by [`ObserverList::subscribe`] and consumed by
/// [`ObserverList::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(usize);

type Listener<E> = Box<dyn FnMut(&E)>;

/// An ordered list of listener closures for events of type `E`.
///
/// Listeners are invoked in subscription order. Unsubscribing leaves a
/// tombstone so that tokens stay stable and removal is O(1); tombstones are
/// dropped once no listener is left. Tokens are never reissued, so a token
/// from before that point cannot remove a newer listener.
pub struct ObserverList<E> {
    listeners: Vec<Option<Listener<E>>>,
    /// Token value of `listeners[0]`.
    base: usize,
    live: usize,
}

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("live", &self.live)
            .field("slots", &self.listeners.len())
            .finish()
    }
}

impl<E> ObserverList<E> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            base: 0,
            live: 0,
        }
    }

    /// Registers `listener` and returns the token needed to remove it.
    pub fn subscribe<F>(&mut self, listener: F) -> ObserverToken
    where
        F: FnMut(&E) + 'static,
    {
        self.listeners.push(Some(Box::new(listener)));
        self.live += 1;
        ObserverToken(self.base + self.listeners.len() - 1)
    }

    /// Removes the listener behind `token`.
    ///
    /// Returns `false` if the token was already removed or never issued by
    /// this list.
    pub fn unsubscribe(&mut self, token: ObserverToken) -> bool {
        let removed = token
            .0
            .checked_sub(self.base)
            .and_then(|index| self.listeners.get_mut(index))
            .is_some_and(|slot| slot.take().is_some());
        if removed {
            self.live -= 1;
            if self.live == 0 {
                self.base += self.listeners.len();
                self.listeners.clear();
            }
        }
        removed
    }

    /// Invokes every live listener with `event`.
    pub fn emit(&mut self, event: &E) {
        for listener in self.listeners.iter_mut().flatten() {
            listener(event);
        }
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
