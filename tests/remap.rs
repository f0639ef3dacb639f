mod common;

use common::{init_tracing, mixed_layout, mixed_row, random_predicate};
use tessera::{
    predicate::{IndexMap, PredicateError},
    Row,
};

const ROWS: i32 = 50;

/// `row` with the cell at `i` moved to `map[i]`.
fn permute(row: &Row, map: &[usize]) -> Row {
    let mut cells = row.cells().to_vec();
    for (source, &target) in map.iter().enumerate() {
        cells[target] = row.cells()[source].clone();
    }
    Row::new(row.key().clone(), cells)
}

#[test]
fn remapped_predicate_reads_permuted_rows() {
    init_tracing();
    let layout = mixed_layout("");
    let mut rng = fastrand::Rng::with_seed(2_024);
    for _ in 0..200 {
        let mut targets: Vec<usize> = (0..layout.width()).collect();
        rng.shuffle(&mut targets);
        let map = IndexMap::from(targets.clone());
        let predicate = random_predicate(&mut rng, &layout, ROWS, 4);
        let moved = predicate.remap(&map).expect("permutation maps every column");
        let back = moved.remap(&map.inverse()).expect("inverse maps every column");
        assert_eq!(back.columns(), predicate.columns());

        for i in 0..ROWS {
            let row = mixed_row(i);
            let expected = predicate.evaluate(&row).expect("evaluate");
            assert_eq!(back.evaluate(&row).expect("evaluate"), expected, "{predicate}");
            assert_eq!(
                moved.evaluate(&permute(&row, &targets)).expect("evaluate"),
                expected,
                "{predicate} moved by {targets:?}"
            );
        }
    }
}

#[test]
fn dropped_column_fails_only_when_read() {
    let layout = mixed_layout("");
    let mut rng = fastrand::Rng::with_seed(17);
    let map = IndexMap::new(vec![Some(0), None, Some(1), Some(2), Some(3)]);
    for _ in 0..200 {
        let predicate = random_predicate(&mut rng, &layout, ROWS, 3);
        match predicate.remap(&map) {
            Ok(moved) => {
                assert!(!predicate.columns().contains(&1), "{predicate}");
                assert!(moved.columns().iter().all(|&index| index < 4));
                assert_eq!(moved.references_row_key(), predicate.references_row_key());
            }
            Err(err) => {
                assert!(predicate.columns().contains(&1), "{predicate}");
                assert_eq!(err, PredicateError::UnmappedColumn(1));
            }
        }
    }
}
