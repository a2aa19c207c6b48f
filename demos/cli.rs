use matcalc::{evaluate_expression, Matrix, NamedMatrix, Step};
use std::io::{BufRead, BufReader};

/// Reads matrix definitions like `A = 1 2; 3 4` from stdin, then evaluates
/// every other line as an expression over them.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let mut matrices: Vec<NamedMatrix> = Vec::new();

    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        match line.find('=') {
            Some(index) => {
                let name = line[..index].trim();
                let rows = line[index + 1..]
                    .split(';')
                    .map(|row| {
                        row.split_whitespace()
                            .map(str::parse)
                            .collect::<Result<Vec<f64>, _>>()
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                matrices.push(NamedMatrix::new(name, Matrix::from_rows(rows)?));
                println!("Defined {}", name);
            },
            None => match evaluate_expression(line, &matrices) {
                Ok(calculation) => {
                    for step in &calculation.trace {
                        print_step(step);
                    }
                    println!("= {:?}", calculation.result);
                },
                Err(e) => eprintln!("Unable to evaluate \"{}\": {}", line, e),
            },
        }
    }

    Ok(())
}

fn print_step(step: &Step) {
    match step {
        Step::Text(message) => println!("{}", message),
        Step::Matrix { title, cells } => {
            println!("{}:", title);
            for row in cells.iter_rows() {
                let rendered: Vec<String> =
                    row.iter().map(ToString::to_string).collect();
                println!("  [{}]", rendered.join(", "));
            }
        },
    }
}
