//! The `examblanc init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examblanc.toml").exists() {
        println!("examblanc.toml already exists, skipping.");
    } else {
        std::fs::write("examblanc.toml", SAMPLE_CONFIG)?;
        println!("Created examblanc.toml");
    }

    std::fs::create_dir_all("content")?;
    write_sample("content/questions.txt", SAMPLE_PRACTICE_SOURCE)?;
    write_sample("content/examen.txt", SAMPLE_EXAM_SOURCE)?;

    println!("\nNext steps:");
    println!("  1. Replace the sample sources in content/ with your corpus");
    println!("  2. Run: examblanc build --source content/questions.txt --kind practice");
    println!("  3. Run: examblanc build --source content/examen.txt --kind exam");
    println!("  4. Run: examblanc mock --exam-id 1");

    Ok(())
}

fn write_sample(path: &str, content: &str) -> Result<()> {
    if std::path::Path::new(path).exists() {
        println!("{path} already exists, skipping.");
    } else {
        std::fs::write(path, content)?;
        println!("Created {path}");
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examblanc configuration

# Where the built catalogues live.
data_dir = "data"
practice_catalogue = "questions.json"
exam_catalogue = "exam_questions.json"

# Where progress files, backups, and reset archives are written.
checkpoint_dir = "checkpoint"

# Autosave batching: flush after this many new answers, or this many seconds.
autosave_answer_threshold = 5
autosave_interval_secs = 300

# Exam slots shown on the dashboard.
exam_slot_count = 10
"#;

const SAMPLE_PRACTICE_SOURCE: &str = r#"Thème 1 : Cadre institutionnel et réglementaire
Question 1
Énoncé de la question 1 : Quelle autorité supervise les marchés financiers en France ?
A - L'Autorité des marchés financiers
B - La Banque centrale européenne
C - Le ministère de l'Économie
Réponse attendue : A

Question 2
Énoncé de la question 2 : Quel organisme agrée les établissements de crédit ?
A - L'AMF
B - L'ACPR
C - La Direction générale du Trésor
Réponse attendue : B

Thème 2 : Déontologie et conformité
Question 3
Énoncé de la question 3 : Un conseiller peut-il garantir la performance future d'un placement ?
A - Oui, pour les produits garantis
B - Non, jamais
C - Oui, avec l'accord écrit du client
Réponse attendue : B
"#;

const SAMPLE_EXAM_SOURCE: &str = r#"Question 1
Thème : Environnement réglementaire
Énoncé de la question : Quel est le rôle principal de l'AMF ?
A - Superviser les marchés financiers et protéger l'épargne
B - Fixer les taux directeurs de la zone euro
C - Collecter les impôts sur les plus-values
Réponse attendue : A

Question 2
Thème : Connaissances techniques
Énoncé de la question : Qu'est-ce qu'une obligation ?
A - Un titre de créance négociable
B - Un titre de propriété sur une entreprise
C - Un contrat d'assurance-vie
Réponse attendue : A

Question 3
Thème : Environnement réglementaire
Énoncé de la question : Le démarchage bancaire et financier est-il encadré par la loi ?
A - Non, il est libre
B - Oui, par le code monétaire et financier
C - Uniquement pour les produits dérivés
Réponse attendue : B

Question 4
Thème : Connaissances techniques
Énoncé de la question : Que mesure le PER d'une action ?
A - Le rapport entre le cours et le bénéfice par action
B - Le rendement du dividende
C - La volatilité du titre
Réponse attendue : A
"#;
