//! Test data generator for dashboard edge case testing
//!
//! Writes `commits.json` and `hierarchy.json` for scenarios exercising:
//! - daily vs weekly date binning
//! - bursts of bug fixes (defect colours, churn spikes)
//! - author legend collisions ("Other")
//! - deep directory trees (label fitting while zooming)
//!
//! Usage:
//!   cargo run --bin test_data_generator [scenario] [output-dir]
//!
//! Scenarios:
//!   simple     - 3 commits, 3 files
//!   weekly     - enough records to switch to weekly bins
//!   bug-burst  - a release followed by a wave of fixes
//!   collisions - two authors sharing a colour
//!   deep       - nested directories six levels down
//!   full       - all of the above combined (default)

use chrono::{DateTime, Duration, TimeZone, Utc};
use codemd_core::{
    BugInfo, CommitRecord, FileInfo, HierarchyNode, KnowledgeInfo, NodeMetrics, TcInfo,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

const AUTHORS: [(&str, &str); 5] = [
    ("alice", "#BE0032"),
    ("bob", "#F3C300"),
    ("carol", "#875692"),
    ("dan", "#F38400"),
    ("erin", "#A1CAF1"),
];

/// Deterministic pseudo-random numbers, no seed file needed
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n.max(1)
    }
}

struct Scenario {
    commits: Vec<CommitRecord>,
    hierarchy: HierarchyNode,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let scenario = args.next().unwrap_or_else(|| "full".to_string());
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let data = match scenario.as_str() {
        "simple" => generate_simple(),
        "weekly" => generate_weekly(),
        "bug-burst" => generate_bug_burst(),
        "collisions" => generate_collisions(),
        "deep" => generate_deep(),
        _ => generate_full(),
    };

    std::fs::create_dir_all(&out_dir)?;
    let commits_path = out_dir.join("commits.json");
    let hierarchy_path = out_dir.join("hierarchy.json");
    std::fs::write(&commits_path, serde_json::to_string_pretty(&data.commits)?)?;
    std::fs::write(&hierarchy_path, serde_json::to_string_pretty(&data.hierarchy)?)?;

    println!(
        "Generated {} and {} with scenario: {}",
        commits_path.display(),
        hierarchy_path.display(),
        scenario
    );
    println!("\nAvailable scenarios:");
    println!("  simple      - 3 commits, 3 files");
    println!("  weekly      - enough records to switch to weekly bins");
    println!("  bug-burst   - a release followed by a wave of fixes");
    println!("  collisions  - two authors sharing a colour");
    println!("  deep        - nested directories six levels down");
    println!("  full        - all scenarios combined (default)");
    println!("\nTo use: cp commits.json hierarchy.json dist/ && make dev");
    Ok(())
}

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 1, 1, 9, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Commit history with running totals filled in
struct History {
    records: Vec<CommitRecord>,
    total_insertions: u64,
    total_deletions: u64,
}

impl History {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            total_insertions: 0,
            total_deletions: 0,
        }
    }

    fn push(&mut self, date: DateTime<Utc>, author: &str, insertions: u64, deletions: u64, bug: bool) {
        self.total_insertions += insertions;
        self.total_deletions += deletions;
        self.records.push(CommitRecord {
            date,
            author: author.to_string(),
            insertions,
            deletions,
            total_insertions: self.total_insertions,
            total_deletions: self.total_deletions,
            bug,
        });
    }
}

/// A file annotated for every mode
fn annotated_file(name: &str, loc: u64, owner: usize, rng: &mut Lcg) -> HierarchyNode {
    let (author, color) = AUTHORS[owner % AUTHORS.len()];
    let created = origin() + Duration::days(rng.below(300) as i64);
    let modified = created + Duration::days(rng.below(400) as i64);
    let bug_count = rng.below(6);
    let coupled = rng.below(4) == 0;

    let mut top_authors = BTreeMap::new();
    top_authors.insert(author.to_string(), 20 + rng.below(80));
    let (second, _) = AUTHORS[(owner + 1) % AUTHORS.len()];
    top_authors.insert(second.to_string(), rng.below(20));

    HierarchyNode {
        name: name.to_string(),
        children: None,
        metrics: NodeMetrics {
            file_info: Some(FileInfo {
                loc,
                creation_date: Some(created),
                last_modified: Some(modified),
                total_revisions: 1 + rng.below(50),
            }),
            bug_info: Some(BugInfo {
                score: bug_count as f64 * 1.7,
                count: bug_count,
                opacity: bug_count as f64 / 5.0,
            }),
            tc_info: Some(TcInfo {
                score: if coupled { 0.8 } else { 0.0 },
                num_revisions: 1 + rng.below(30),
                coupled_module: coupled.then(|| "src/core/engine.rs".to_string()),
                num_mutual_revisions: if coupled { rng.below(10) } else { 0 },
                percent: if coupled { 60.0 } else { 0.0 },
                color: coupled.then(|| "#1f77b4".to_string()),
                opacity: if coupled { 0.8 } else { 0.0 },
            }),
            knowledge_info: Some(KnowledgeInfo {
                top_authors,
                author: Some(author.to_string()),
                color: Some(color.to_string()),
            }),
        },
    }
}

fn generate_simple() -> Scenario {
    let mut rng = Lcg(1);
    let mut history = History::new();
    history.push(origin(), "alice", 120, 0, false);
    history.push(origin() + Duration::days(1), "bob", 30, 10, true);
    history.push(origin() + Duration::days(3), "alice", 15, 40, false);

    Scenario {
        commits: history.records,
        hierarchy: HierarchyNode::directory(
            "simple",
            vec![
                HierarchyNode::directory(
                    "src",
                    vec![
                        annotated_file("lib.rs", 900, 0, &mut rng),
                        annotated_file("main.rs", 300, 1, &mut rng),
                    ],
                ),
                annotated_file("README.md", 80, 0, &mut rng),
            ],
        ),
    }
}

/// Records spread over several years, more than the daily-bin limit
fn generate_weekly() -> Scenario {
    let mut rng = Lcg(7);
    let mut history = History::new();
    let mut at = origin();
    for _ in 0..7500 {
        at += Duration::minutes(60 + rng.below(240) as i64);
        let (author, _) = AUTHORS[rng.below(AUTHORS.len() as u64) as usize];
        history.push(at, author, rng.below(200), rng.below(120), rng.below(10) == 0);
    }

    let files = (0..40)
        .map(|i| annotated_file(&format!("module_{:02}.rs", i), 50 + rng.below(2000), i, &mut rng))
        .collect();

    Scenario {
        commits: history.records,
        hierarchy: HierarchyNode::directory("weekly", vec![HierarchyNode::directory("src", files)]),
    }
}

/// Quiet development, a large release, then daily bug fixes
fn generate_bug_burst() -> Scenario {
    let mut rng = Lcg(3);
    let mut history = History::new();
    for day in 0..60 {
        history.push(origin() + Duration::days(day), "carol", 40 + rng.below(40), rng.below(10), false);
    }
    let release = origin() + Duration::days(60);
    history.push(release, "dan", 5000, 200, false);
    for day in 1..30 {
        for fix in 0..(30 - day) / 5 + 1 {
            let at = release + Duration::days(day) + Duration::hours(fix);
            history.push(at, "erin", rng.below(20), 10 + rng.below(60), true);
        }
    }

    let files = ["api.rs", "db.rs", "release.rs", "handlers.rs"]
        .iter()
        .enumerate()
        .map(|(i, name)| annotated_file(name, 200 + rng.below(800), i + 2, &mut rng))
        .collect();

    Scenario {
        commits: history.records,
        hierarchy: HierarchyNode::directory("bug-burst", vec![HierarchyNode::directory("server", files)]),
    }
}

/// `alice` and `zoe` share a colour, so the legend shows "Other"
fn generate_collisions() -> Scenario {
    let mut rng = Lcg(5);
    let mut history = History::new();
    history.push(origin(), "alice", 50, 0, false);
    history.push(origin() + Duration::days(2), "zoe", 20, 5, false);

    let mut shared = annotated_file("shared.rs", 400, 0, &mut rng);
    if let Some(knowledge) = shared.metrics.knowledge_info.as_mut() {
        knowledge.author = Some("zoe".to_string());
        knowledge.top_authors.insert("zoe".to_string(), 500);
    }

    Scenario {
        commits: history.records,
        hierarchy: HierarchyNode::directory(
            "collisions",
            vec![
                annotated_file("alice.rs", 300, 0, &mut rng),
                shared,
                annotated_file("bob.rs", 200, 1, &mut rng),
            ],
        ),
    }
}

fn nested(depth: usize, rng: &mut Lcg) -> HierarchyNode {
    let name = format!("level_{}", depth);
    if depth == 6 {
        return HierarchyNode::directory(
            name,
            vec![
                annotated_file("a_very_long_file_name_that_needs_truncation.rs", 40, depth, rng),
                annotated_file("x.rs", 10, depth + 1, rng),
            ],
        );
    }
    HierarchyNode::directory(
        name,
        vec![
            nested(depth + 1, rng),
            annotated_file(&format!("sibling_{}.rs", depth), 100 * (depth as u64 + 1), depth, rng),
        ],
    )
}

fn generate_deep() -> Scenario {
    let mut rng = Lcg(11);
    let mut history = History::new();
    for day in 0..14 {
        let (author, _) = AUTHORS[day % AUTHORS.len()];
        history.push(origin() + Duration::days(day as i64), author, 25, 5, day % 4 == 0);
    }

    Scenario {
        commits: history.records,
        hierarchy: HierarchyNode::directory("deep", vec![nested(1, &mut rng)]),
    }
}

fn generate_full() -> Scenario {
    let parts = [
        generate_simple(),
        generate_bug_burst(),
        generate_collisions(),
        generate_deep(),
    ];

    // Replay every history on one timeline so the running totals stay monotone
    let mut events: Vec<CommitRecord> = parts.iter().flat_map(|p| p.commits.iter().cloned()).collect();
    events.sort_by_key(|r| r.date);
    let mut history = History::new();
    for event in events {
        history.push(event.date, &event.author, event.insertions, event.deletions, event.bug);
    }

    let children = parts.into_iter().map(|p| p.hierarchy).collect();
    Scenario {
        commits: history.records,
        hierarchy: HierarchyNode::directory("full", children),
    }
}
