//! Built-in skill vocabulary and phrase detection over token streams.

use std::collections::HashSet;

use crate::matcher::keyword::tokenize;

/// Display names of recognised skills. Multi-word entries are matched as
/// consecutive tokens, so "Machine Learning" needs both words adjacent.
pub const SKILL_VOCABULARY: &[&str] = &[
    // Languages
    "Python", "Java", "JavaScript", "TypeScript", "Rust", "Golang", "C++", "C#",
    "Ruby", "PHP", "Scala", "Kotlin", "Swift", "SQL", "Bash", "MATLAB", "Haskell",
    "Elixir", "Perl",
    // Web & frameworks
    "React", "Angular", "Vue", "Node.js", "Django", "Flask", "FastAPI", "Spring Boot",
    "Ruby on Rails", ".NET", "HTML", "CSS", "GraphQL", "gRPC", "Tokio",
    // Data & ML
    "Machine Learning", "Deep Learning", "Data Analysis", "Data Visualization",
    "Statistics", "NLP", "Natural Language Processing", "Computer Vision", "PyTorch",
    "TensorFlow", "Scikit-learn", "Pandas", "NumPy", "Spark", "Hadoop", "Airflow",
    "dbt", "Tableau", "Power BI", "Excel", "ETL", "Data Engineering",
    // Storage
    "PostgreSQL", "MySQL", "MongoDB", "Redis", "Elasticsearch", "Cassandra",
    "DynamoDB", "Snowflake", "BigQuery", "Kafka", "RabbitMQ",
    // Infrastructure
    "AWS", "Azure", "GCP", "Docker", "Kubernetes", "Terraform", "Ansible", "Linux",
    "CI/CD", "Jenkins", "GitHub Actions", "Git", "Microservices", "Distributed Systems",
    "DevOps", "Observability", "Prometheus", "Grafana",
    // Practice
    "Agile", "Scrum", "Project Management", "Product Management", "Leadership",
    "Communication", "Stakeholder Management", "Testing", "Unit Testing", "Security",
    "System Design", "Embedded", "Networking",
];

/// A vocabulary entry with its pre-computed token pattern.
#[derive(Debug, Clone)]
pub struct Skill {
    pub name: &'static str,
    pattern: Vec<String>,
}

pub fn vocabulary() -> Vec<Skill> {
    SKILL_VOCABULARY
        .iter()
        .map(|&name| Skill {
            name,
            pattern: tokenize(name),
        })
        .filter(|s| !s.pattern.is_empty())
        .collect()
}

/// Returns the skills present in `tokens`, ordered by their first position.
/// Skills starting at the same token are listed in vocabulary order.
pub fn find_skills(tokens: &[String], vocabulary: &[Skill]) -> Vec<&'static str> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for start in 0..tokens.len() {
        let rest = &tokens[start..];
        for skill in vocabulary {
            if rest.starts_with(&skill.pattern) && seen.insert(skill.name) {
                found.push(skill.name);
            }
        }
    }
    found
}
