use std::path::{Path, PathBuf};

pub const SEPARATOR: &str = "================\n";
pub const TEST_DIR: &str = "tests";
pub const EXTENSION: &str = "map";

/// A `.map` fixture: the input above the first separator, then the expected output.
pub struct Fixture {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

impl Fixture {
    pub fn input(&self) -> &str {
        input_of(&self.content)
    }
}

/// Splits a fixture into its input part and the expected tail.
pub fn input_of(content: &str) -> &str {
    content
        .split_once(SEPARATOR)
        .map_or(content, |(input, _)| input)
        .trim()
}

fn fixtures(subdir: &str) -> Vec<Fixture> {
    let mut fixtures = std::fs::read_dir(Path::new(TEST_DIR).join(subdir))
        .unwrap()
        .map(|ent| ent.unwrap().path())
        .filter(|path| path.extension().map_or(false, |ext| ext == EXTENSION))
        .map(|path| Fixture {
            name: path.file_stem().unwrap().to_string_lossy().into_owned(),
            content: std::fs::read_to_string(&path).unwrap(),
            path,
        })
        .collect::<Vec<_>>();
    fixtures.sort_by(|a, b| a.name.cmp(&b.name));
    fixtures
}

/// First line where `got` departs from `expected`, 1-based.
fn first_difference(expected: &str, got: &str) -> usize {
    let mut lines = expected.lines().zip(got.lines());
    let same = lines.by_ref().take_while(|(e, g)| e == g).count();
    same + 1
}

/// Runs `f` on every fixture under `tests/<subdir>` and exits non-zero on any mismatch.
/// With `UPDATE_EXPECT=1`, mismatching fixtures are rewritten instead.
pub fn run_tests(subdir: &str, mut f: impl FnMut(&str) -> anyhow::Result<String>) {
    let fixtures = fixtures(subdir);
    let update = std::env::var("UPDATE_EXPECT").map_or(false, |v| v == "1");

    let (mut failed, mut updated) = (0, 0);
    for fixture in &fixtures {
        eprint!("{}/{}: ", subdir, fixture.name);
        match f(&fixture.content) {
            Ok(got) if got == fixture.content => eprintln!("\x1B[32mOK\x1B[0m"),
            Ok(got) if update => {
                std::fs::write(&fixture.path, got).unwrap();
                eprintln!("\x1B[33mUpdated\x1B[0m");
                updated += 1;
            }
            Ok(got) => {
                let line = first_difference(&fixture.content, &got);
                eprintln!("\x1B[31mFAILED\x1B[0m at line {line}\n{got}");
                failed += 1;
            }
            Err(err) => {
                eprintln!("\x1B[31mERROR\x1B[0m {err:#}\n{}", fixture.input());
                failed += 1;
            }
        }
    }

    eprintln!(
        "{} fixtures, {failed} failed, {updated} updated",
        fixtures.len()
    );
    if failed != 0 {
        std::process::exit(1);
    }
}
