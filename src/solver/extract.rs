//! Decodes accepted variable values into ordered tours.

use log::warn;

use crate::models::{Instance, Tour};

use super::separator::INTEGRAL_ACTIVE;
use super::variables::Variables;

/// Walks the active edges of every vehicle from the depot.
pub fn extract_tours(instance: &Instance, vars: &Variables, values: &[f64]) -> Vec<Tour> {
    (0..instance.num_vehicles())
        .map(|v| walk(instance, vars, v, values))
        .collect()
}

fn walk(instance: &Instance, vars: &Variables, vehicle: usize, values: &[f64]) -> Tour {
    let graph = instance.graph();
    let depot = instance.depot();
    let length = values[vars.length(vehicle).index()];

    // depot edges of single-customer tours carry 2 and are walked twice
    let mut remaining: Vec<(usize, u32)> = (0..graph.num_edges())
        .filter_map(|e| {
            let x = values[vars.edge(vehicle, e).index()];
            (x > INTEGRAL_ACTIVE).then(|| (e, x.round().max(1.0) as u32))
        })
        .collect();
    let steps: u32 = remaining.iter().map(|&(_, n)| n).sum();
    if steps == 0 {
        return Tour::idle(vehicle, depot);
    }

    let mut tour = Vec::with_capacity(steps as usize + 1);
    tour.push(depot);
    let mut current = depot;
    for _ in 0..steps {
        let next = remaining
            .iter_mut()
            .find(|(e, n)| *n > 0 && graph.edge(*e).touches(current));
        let Some((e, n)) = next else {
            warn!("vehicle {vehicle}: tour walk stuck at vertex {current}");
            break;
        };
        *n -= 1;
        current = graph.edge(*e).other(current);
        tour.push(current);
    }
    if current != depot {
        warn!("vehicle {vehicle}: tour walk ended at {current}, not at the depot");
    }
    Tour::new(vehicle, tour, length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Metric;
    use crate::mip::Model;
    use crate::models::{Coords, Objective};

    fn setup() -> (Instance, Variables, usize) {
        let coords = vec![
            Coords::new(0.0, 0.0),
            Coords::new(1.0, 0.0),
            Coords::new(1.0, 1.0),
            Coords::new(0.0, 1.0),
            Coords::new(-1.0, 0.0),
        ];
        let inst = Instance::from_coords("x", coords, Metric::Euclidean, 3, 0).unwrap();
        let mut model = Model::new();
        let vars = Variables::create(&mut model, &inst, Objective::Min);
        (inst, vars, model.num_vars())
    }

    #[test]
    fn test_extracts_all_shapes() {
        let (inst, vars, n) = setup();
        let mut values = vec![0.0; n];
        let g = inst.graph();
        let set = |values: &mut Vec<f64>, var: crate::mip::Var, x: f64| values[var.index()] = x;

        for v in 0..3 {
            set(&mut values, vars.vertex(v, 0), 1.0);
        }
        // vehicle 0: 0 -> 1 -> 2 -> 3 -> 0
        for i in 1..=3 {
            set(&mut values, vars.vertex(0, i), 1.0);
        }
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            set(&mut values, vars.edge(0, g.edge_between(a, b).unwrap()), 1.0);
        }
        set(&mut values, vars.length(0), 4.0);
        // vehicle 1: single customer 4
        set(&mut values, vars.vertex(1, 4), 1.0);
        set(&mut values, vars.edge(1, g.edge_between(0, 4).unwrap()), 2.0);
        set(&mut values, vars.length(1), 2.0);

        let tours = extract_tours(&inst, &vars, &values);
        assert_eq!(tours.len(), 3);

        let first = tours[0].vertices();
        assert_eq!(first.len(), 5);
        assert_eq!(first[0], 0);
        assert_eq!(first[4], 0);
        let mut inner = first[1..4].to_vec();
        inner.sort_unstable();
        assert_eq!(inner, vec![1, 2, 3]);
        assert_eq!(tours[0].length(), 4.0);

        assert_eq!(tours[1].vertices(), &[0, 4, 0]);
        assert_eq!(tours[1].length(), 2.0);

        assert!(tours[2].is_idle());
        assert_eq!(tours[2].vertices(), &[0]);
        assert_eq!(tours[2].length(), 0.0);
    }
}
