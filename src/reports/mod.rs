use chespi::api::{PredictionAccuracy, ScoreReport};
use chespi::error::ChespiResult;
use chespi::optimizer::runner::Prediction;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use std::fs;

/// Residues per row of the sequence block.
const BLOCK_WIDTH: usize = 50;

pub fn print_prediction(p: &Prediction) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Energy").add_attribute(Attribute::Bold),
        Cell::new("Guess"),
        Cell::new("Gain").fg(Color::Green),
        Cell::new("Spread"),
        Cell::new("Pop"),
        Cell::new("Tried"),
        Cell::new("Accepted"),
    ]);
    for i in 0..=6 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
    table.add_row(vec![
        Cell::new(format!("{:.3}", p.energy)).add_attribute(Attribute::Bold),
        Cell::new(format!("{:.3}", p.guess_energy)),
        Cell::new(format!("{:.3}", p.improvement)).fg(Color::Green),
        Cell::new(format!("{:.3}", p.spread)),
        Cell::new(p.population_size),
        Cell::new(p.stats.attempts),
        Cell::new(p.stats.accepted),
    ]);
    println!("\n{}", table);

    let ss8: Vec<char> = p.labels.chars().collect();
    let ss3: Vec<char> = p.classes.chars().collect();
    let seq: Vec<char> = p.sequence.chars().collect();
    let conf8: Vec<char> = p.confidence8.chars().collect();
    let conf3: Vec<char> = p.confidence3.chars().collect();

    let mut block = Table::new();
    block.load_preset(ASCII_FULL);
    for start in (0..seq.len()).step_by(BLOCK_WIDTH) {
        let end = (start + BLOCK_WIDTH).min(seq.len());
        let ruler: String = (start..end)
            .map(|i| char::from_digit(((i + 1) % 10) as u32, 10).unwrap_or(' '))
            .collect();
        block.add_row(vec![Cell::new(format!("{}", start + 1)), Cell::new(ruler)]);
        block.add_row(vec![
            Cell::new("seq"),
            Cell::new(seq[start..end].iter().collect::<String>()),
        ]);
        block.add_row(vec![
            Cell::new("ss8").fg(Color::Cyan),
            Cell::new(ss8[start..end].iter().collect::<String>()).fg(Color::Cyan),
        ]);
        block.add_row(vec![
            Cell::new("conf8"),
            Cell::new(conf8[start..end].iter().collect::<String>()),
        ]);
        block.add_row(vec![
            Cell::new("ss3").fg(Color::Cyan),
            Cell::new(ss3[start..end].iter().collect::<String>()).fg(Color::Cyan),
        ]);
        block.add_row(vec![
            Cell::new("conf3"),
            Cell::new(conf3[start..end].iter().collect::<String>()),
        ]);
    }
    println!("\n{}", block);
}

pub fn print_residue_table(p: &Prediction) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("AA"),
        Cell::new("SS8").fg(Color::Cyan),
        Cell::new("H"),
        Cell::new("G"),
        Cell::new("I"),
        Cell::new("E"),
        Cell::new("-"),
        Cell::new("T"),
        Cell::new("S"),
        Cell::new("B"),
        Cell::new("C8"),
        Cell::new("C3"),
    ]);
    for i in 3..=10 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for r in &p.residues {
        let mut row = vec![
            Cell::new(r.resi),
            Cell::new(r.aa),
            Cell::new(r.label).fg(Color::Cyan),
        ];
        for (i, prob) in r.probs8.iter().enumerate() {
            let cell = Cell::new(format!("{:.2}", prob));
            row.push(if i == r.max8.index() {
                cell.add_attribute(Attribute::Bold)
            } else {
                cell
            });
        }
        row.push(Cell::new(r.confidence8));
        row.push(Cell::new(r.confidence3));
        table.add_row(row);
    }
    println!("\n{}", table);
}

pub fn print_score(report: &ScoreReport) {
    println!("\nLabels: {}", report.labels);
    println!("Energy: {:.3}", report.energy);
    if let Some(acc) = &report.accuracy {
        println!("Q8: {:.3}  Q3: {:.3}", acc.q8, acc.q3);
    }

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("AA"),
        Cell::new("SS8").fg(Color::Cyan),
        Cell::new("PC1 obs"),
        Cell::new("PC1 calc"),
        Cell::new("PC2 obs"),
        Cell::new("PC2 calc"),
        Cell::new("ln post"),
    ]);
    for i in 3..=7 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for r in &report.residues {
        let (obs1, obs2) = match r.observed {
            Some([a, b]) => (format!("{:.3}", a), format!("{:.3}", b)),
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(r.resi),
            Cell::new(r.aa),
            Cell::new(r.label).fg(Color::Cyan),
            Cell::new(obs1),
            Cell::new(format!("{:.3}", r.predicted[0])),
            Cell::new(obs2),
            Cell::new(format!("{:.3}", r.predicted[1])),
            Cell::new(format!("{:.3}", r.log_posterior)),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_accuracy(acc: &PredictionAccuracy) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Reference").add_attribute(Attribute::Bold),
        Cell::new("Q8"),
        Cell::new("Q3"),
    ]);
    for i in 1..=2 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
    for (name, a) in [("Best", acc.best), ("Consensus", acc.consensus)] {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.3}", a.q8)).fg(Color::Green),
            Cell::new(format!("{:.3}", a.q3)).fg(Color::Green),
        ]);
    }
    println!("\n{}", table);
    println!("Mean frequency of reference label: {:.3}", acc.reference_frequency);
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> ChespiResult<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[derive(Serialize)]
struct ResidueRow {
    resi: usize,
    aa: char,
    ss8: String,
    ss3: String,
    p_h: f64,
    p_g: f64,
    p_i: f64,
    p_e: f64,
    p_loop: f64,
    p_t: f64,
    p_s: f64,
    p_b: f64,
    p3_h: f64,
    p3_s: f64,
    p3_c: f64,
    conf8: char,
    conf3: char,
    p0: f64,
}

pub fn write_residue_csv(path: &str, p: &Prediction) -> ChespiResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in &p.residues {
        wtr.serialize(ResidueRow {
            resi: r.resi,
            aa: r.aa,
            ss8: r.label.to_string(),
            ss3: r.class.to_string(),
            p_h: r.probs8[0],
            p_g: r.probs8[1],
            p_i: r.probs8[2],
            p_e: r.probs8[3],
            p_loop: r.probs8[4],
            p_t: r.probs8[5],
            p_s: r.probs8[6],
            p_b: r.probs8[7],
            p3_h: r.probs3[0],
            p3_s: r.probs3[1],
            p3_c: r.probs3[2],
            conf8: r.confidence8,
            conf3: r.confidence3,
            p0: r.p0,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
