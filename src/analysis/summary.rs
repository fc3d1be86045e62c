use std::collections::BTreeMap;

use crate::core::network::Network;

/// Installed and extendable capacity per carrier.
pub fn capacity_by_carrier(n: &Network) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for generator in n.generators() {
        *totals.entry(generator.carrier.clone()).or_insert(0.0) += generator.p_nom;
    }
    for unit in n.storage_units() {
        *totals.entry(unit.carrier.clone()).or_insert(0.0) += unit.p_nom;
    }
    totals
}

pub fn print_network_summary(n: &Network) {
    println!("\nNetwork {} Summary", n.name());
    println!("----------------------------------------");
    println!("Buses: {}", n.buses().len());
    println!("Lines: {} (+{} links)", n.lines().len(), n.links().len());
    println!("Generators: {}", n.generators().len());
    println!("Storage Units: {}", n.storage_units().len());
    println!("Loads: {}", n.loads().len());
    println!("Global Constraints: {}", n.global_constraints().len());

    if let (Some(first), Some(last)) = (n.snapshots().first(), n.snapshots().last()) {
        println!(
            "Snapshots: {} ({} to {}, {:.3} years)",
            n.snapshots().len(),
            first,
            last,
            n.n_years()
        );
    } else {
        println!("Snapshots: none");
    }

    let peak = n
        .total_load_per_snapshot()
        .into_iter()
        .fold(0.0_f64, f64::max);
    println!("Peak Load: {:.2} MW", peak);

    println!("Installed Capacity by Carrier:");
    for (carrier, p_nom) in capacity_by_carrier(n) {
        let extendable = n
            .generators()
            .iter()
            .any(|g| g.carrier == carrier && g.p_nom_extendable)
            || n.storage_units()
                .iter()
                .any(|s| s.carrier == carrier && s.p_nom_extendable);
        println!(
            "  {}: {:.1} MW{}",
            carrier,
            p_nom,
            if extendable { " (extendable)" } else { "" }
        );
    }

    for constraint in n.global_constraints() {
        if constraint.bus.is_none() {
            println!(
                "Constraint {}: {} {} {:.3e}",
                constraint.name, constraint.carrier_attribute, constraint.sense, constraint.constant
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bus::Bus;
    use crate::models::generator::Generator;
    use crate::models::storage_unit::StorageUnit;
    use crate::utils::spatial::Coordinate;

    #[test]
    fn capacity_sums_generators_and_storage() {
        let mut n = Network::new("test".to_string());
        n.add_bus(Bus::new("A".to_string(), 400.0, Coordinate::new(0.0, 0.0), 1.0));
        n.add_generator(Generator {
            name: "A coal".to_string(),
            bus: "A".to_string(),
            carrier: "coal".to_string(),
            p_nom: 1000.0,
            ..Default::default()
        });
        n.add_generator(Generator {
            name: "B coal".to_string(),
            bus: "A".to_string(),
            carrier: "coal".to_string(),
            p_nom: 500.0,
            ..Default::default()
        });
        n.add_storage_unit(StorageUnit {
            name: "A PHS".to_string(),
            bus: "A".to_string(),
            carrier: "PHS".to_string(),
            p_nom: 1300.0,
            ..Default::default()
        });
        let totals = capacity_by_carrier(&n);
        assert_eq!(totals["coal"], 1500.0);
        assert_eq!(totals["PHS"], 1300.0);
    }
}
