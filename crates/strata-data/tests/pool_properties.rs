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

//! Handle properties checked through the public API with a typed handle.

use strata_core::renderer::ResourceError;
use strata_data::{strata_handle, Entity, Pool};

strata_handle! {
    /// Test handle.
    pub struct MeshHandle(u32);
}

#[derive(Debug, PartialEq)]
struct Mesh {
    vertices: u32,
}

#[test]
fn capacity_four_generation_safety() {
    let mut pool: Pool<MeshHandle, Mesh> = Pool::new("mesh", 4);
    let h: Vec<MeshHandle> = (0..4)
        .map(|i| pool.push_back(Mesh { vertices: i }).unwrap())
        .collect();

    pool.erase(h[1]);
    let h1_prime = pool.push_back(Mesh { vertices: 99 }).unwrap();

    assert_eq!(h1_prime.index(), 1);
    assert_ne!(h1_prime, h[1]);
    assert!(!pool.is_valid(h[1]));
    assert!(pool.is_valid(h1_prime));
    for other in [h[0], h[2], h[3]] {
        assert!(pool.is_valid(other));
    }
}

#[test]
fn fifth_push_into_full_pool_fails() {
    let mut pool: Pool<MeshHandle, Mesh> = Pool::new("mesh", 4);
    for i in 0..4 {
        pool.push_back(Mesh { vertices: i }).unwrap();
    }
    let before: Vec<_> = pool.iter().map(|(h, m)| (h, m.vertices)).collect();

    assert!(matches!(
        pool.push_back(Mesh { vertices: 4 }),
        Err(ResourceError::CapacityExceeded { capacity: 4, .. })
    ));

    let after: Vec<_> = pool.iter().map(|(h, m)| (h, m.vertices)).collect();
    assert_eq!(before, after);
}

#[test]
fn default_typed_handle_is_never_valid() {
    let mut pool: Pool<MeshHandle, Mesh> = Pool::new("mesh", 1);
    pool.push_back(Mesh { vertices: 3 }).unwrap();

    assert!(MeshHandle::default().is_null());
    assert!(!pool.is_valid(MeshHandle::default()));
    assert_eq!(u64::from(MeshHandle::from_parts(2, 1)), 0x0001_0002);
}
