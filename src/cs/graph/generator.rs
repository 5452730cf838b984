use crate::cs::error::{Error, Result};
use crate::cs::graph::network::{Link, Network};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Generates a reproducible random network for testing and benchmarking.
///
/// A random path through all nodes from `0` to `nodes - 1` is laid down
/// first so the sink is reachable; the remaining links join random distinct
/// node pairs. Capacities are drawn from `1..=max_capacity`, and a few
/// zero-capacity links are mixed in.
///
/// # Arguments
/// - `seed`: Seed for the generator; the same seed gives the same network.
/// - `nodes`: Number of nodes, at least two.
/// - `edges`: Number of links. Values below `nodes - 1` only shorten the path.
/// - `max_capacity`: Largest capacity, at least one.
///
/// # Errors
/// `Error::InvalidInput` for fewer than two nodes or a `max_capacity` below
/// one. `Error::CapacityOverflow` when the drawn capacities exceed the
/// per-node limit of [`Network::add_edge`].
pub fn random_network(
    seed: u64,
    nodes: usize,
    edges: usize,
    max_capacity: i64,
) -> Result<Network> {
    if nodes < 2 {
        return Err(Error::invalid("a flow network needs a source and a sink"));
    }
    if max_capacity < 1 {
        return Err(Error::invalid(format!(
            "max_capacity must be at least 1, got {}",
            max_capacity
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);

    let mut middle: Vec<usize> = (1..nodes - 1).collect();
    middle.shuffle(&mut rng);
    let path: Vec<usize> = std::iter::once(0)
        .chain(middle)
        .chain(std::iter::once(nodes - 1))
        .collect();

    let mut links: Vec<Link> = path
        .windows(2)
        .take(edges)
        .map(|pair| Link {
            u: pair[0],
            v: pair[1],
            capacity: rng.gen_range(1..=max_capacity),
        })
        .collect();

    while links.len() < edges {
        let u = rng.gen_range(0..nodes);
        let v = rng.gen_range(0..nodes);
        if u == v {
            continue;
        }
        let capacity = if rng.gen_ratio(1, 20) {
            0
        } else {
            rng.gen_range(1..=max_capacity)
        };
        links.push(Link { u, v, capacity });
    }

    let mut network = Network::new(nodes);
    for link in links {
        network.add_edge(link.u, link.v, link.capacity)?;
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_network_is_reproducible() {
        let a = random_network(42, 10, 25, 9).unwrap();
        let b = random_network(42, 10, 25, 9).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, random_network(43, 10, 25, 9).unwrap());
    }

    #[test]
    fn test_random_network_shape() {
        let network = random_network(1, 8, 20, 5).unwrap();
        assert_eq!(network.node_count(), 8);
        assert_eq!(network.links().len(), 20);
        for link in network.links() {
            assert_ne!(link.u, link.v);
            assert!((0..=5).contains(&link.capacity));
        }
    }

    #[test]
    fn test_random_network_spans_source_to_sink() {
        let network = random_network(3, 6, 5, 4).unwrap();
        let links = network.links();
        assert_eq!(links.first().map(|l| l.u), Some(0));
        assert_eq!(links.last().map(|l| l.v), Some(5));
        for pair in links.windows(2) {
            assert_eq!(pair[0].v, pair[1].u);
        }
    }

    #[test]
    fn test_random_network_invalid_arguments() {
        assert!(matches!(
            random_network(0, 1, 3, 5),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            random_network(0, 4, 3, 0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_random_network_capacity_overflow() {
        assert!(matches!(
            random_network(9, 3, 40, i64::MAX),
            Err(Error::CapacityOverflow { .. })
        ));
    }
}
