use coursefib::course::CourseTable;
use coursefib::serilize::{CourseList, TimetableInfo};
use coursefib::{Catalog, EngineConfig, Error, Scheduler};
use std::io::Write;
use std::path::PathBuf;

fn print_help() {
    println!("Commands:");
    println!("  ADD <course code>");
    println!("  REMOVE <course code>");
    println!("  CLEAR");
    println!("  FIND [course code]");
    println!("  MORNINGS <ON|OFF>");
    println!("  SCHEDULE");
    println!("  EXIT");
}

fn main() -> coursefib::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data.csv".to_string());
    let config = match std::env::args().nth(2) {
        Some(config_path) => EngineConfig::from_file(config_path)?,
        None => EngineConfig::default(),
    };

    let table = CourseTable::load(PathBuf::from(path))?;
    let mut scheduler = Scheduler::new(Catalog::try_from(&table)?, config);
    let mut courses: Vec<String> = Vec::new();

    loop {
        println!("Current courses: {:?}", courses);

        print!("> ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim().to_uppercase();
        let input: Vec<&str> = input.split_whitespace().collect();

        if input.is_empty() {
            print!("\x1B[2J\x1B[1;1H");
            println!("Please enter a command");
            print_help();
            continue;
        }

        match input[0] {
            "ADD" | "+" if input.len() == 2 => {
                if scheduler.catalog().get(input[1]).is_none() {
                    println!("Course not found");
                    continue;
                }
                if !courses.iter().any(|c| c == input[1]) {
                    courses.push(input[1].to_string());
                }
            }
            "REMOVE" | "-" if input.len() == 2 => {
                courses.retain(|c| c != input[1]);
            }
            "CLEAR" | "--" => {
                courses.clear();
            }
            "FIND" | "LS" => {
                print!("\x1B[2J\x1B[1;1H");
                let found = if input.len() == 2 {
                    table.to_lazy().contains(&input[1..]).collect()?
                } else {
                    table.clone()
                };
                println!("{}", found);
                let catalog = Catalog::try_from(&found)?;
                println!("{}", serde_json::to_string_pretty(&CourseList::from(&catalog))?);
            }
            "MORNINGS" if input.len() == 2 => {
                scheduler.set_prefer_mornings(input[1] == "ON");
            }
            "SCHEDULE" | "S" => {
                print!("\x1B[2J\x1B[1;1H");
                let codes: Vec<&str> = courses.iter().map(|c| c.as_str()).collect();
                match scheduler.best(&codes) {
                    Ok(Some(best)) => {
                        println!("{}", best.selection);
                        let info = TimetableInfo::new(&best, scheduler.catalog());
                        println!("{}", serde_json::to_string_pretty(&info)?);
                    }
                    Ok(None) => println!("No timetable fits these courses"),
                    Err(Error::SearchAborted { limit }) => {
                        println!("Gave up after {} search nodes, remove some courses", limit)
                    }
                    Err(e) => return Err(e),
                }
            }
            "EXIT" => {
                break;
            }
            _ => {
                print!("\x1B[2J\x1B[1;1H");
                println!("Invalid command");
                print_help();
            }
        }
    }

    Ok(())
}
