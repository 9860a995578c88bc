//! Prompts for every generation and classification step
//!
//! Each generation prompt opens with a `Task:` line so transcripts (and
//! test doubles) can tell the steps apart.

use argmap_domain::{ArgumentCandidate, Valence};

/// Background shared by the argumentation prompts
const ARGUMENT_PRIMER: &str = "\
In critical thinking, an argument is a list of statements: one of them is \
the conclusion, the others are premises offered as reasons for accepting it. \
To give an argument is to provide premises in support of a conclusion; it \
need not be an attack on anyone.

Example:
> If you want to find a good job, you should work hard. You do want to find a \
good job. So you should work hard.

The first two sentences are the premises, the last one is the conclusion.";

/// Expected shape of a premise list
pub const PREMISES_SCHEMA: &str = r#"{"premises": ["<premise as one concise sentence>", ...]}"#;

/// Expected shape of a plausibility ranking
pub const RANKING_SCHEMA: &str = r#"{"ranking": ["P<n>", ...]}"#;

/// Expected shape of an argument batch
pub const ARGUMENTS_SCHEMA: &str =
    r#"{"arguments": [{"label": "<catchy title>", "claim": "<one concise statement>"}, ...]}"#;

/// Expected shape of a salience selection
pub const SELECTION_SCHEMA: &str = r#"{"selected": ["<label>", ...]}"#;

/// Labels of the semantic (entailment) check
pub const SEMANTIC_LABELS: [&str; 3] = ["entails", "contradicts", "is neutral wrt."];

/// Hypothesis template of the semantic check
pub const SEMANTIC_TEMPLATE: &str = "CLAIM_1 {} CLAIM_2";

/// Label that counts as entailment
pub const ENTAILS: &str = "entails";

/// Labels of the dialectical check
pub const DIALECTIC_LABELS: [&str; 3] = [
    "directly confirmed by",
    "directly disconfirmed by",
    "independent of",
];

/// Hypothesis template of the dialectical check
pub const DIALECTIC_TEMPLATE: &str = "CLAIM is {} REASON.";

/// Dialectical label required for a given valence
pub fn dialectic_label(valence: Valence) -> &'static str {
    match valence {
        Valence::Pro => DIALECTIC_LABELS[0],
        Valence::Con => DIALECTIC_LABELS[1],
    }
}

/// Premise extraction for a non-root claim
pub fn premises(claim: &str, parent_claim: &str, valence: Valence, max: usize) -> String {
    format!(
        "Task: Identify the premises of an argument.\n\n\
         /// background\n{primer}\n///\n\n\
         In a debate you maintained that:\n\n\
         [[A]] {claim}\n\n\
         which you advanced as a reason {relation}:\n\n\
         [[B]] {parent}\n\n\
         Identify the premises (up to {max}) of argument [[A]]. State each premise \
         as a single, concise sentence. Premises must not overlap.",
        primer = ARGUMENT_PRIMER,
        claim = claim,
        relation = valence.relation_phrase(),
        parent = parent_claim,
        max = max,
    )
}

fn numbered_premises(premises: &[String]) -> String {
    premises
        .iter()
        .enumerate()
        .map(|(i, p)| format!("P{}. {}", i + 1, p))
        .collect::<Vec<_>>()
        .join("\n")
}

fn domain_line(tags: &[String]) -> String {
    if tags.is_empty() {
        "Domain: general".to_string()
    } else {
        format!("Domain: {}", tags.join(" - "))
    }
}

/// Free-text plausibility assessment of each premise
pub fn assessment(premises: &[String], tags: &[String]) -> String {
    format!(
        "Task: Assess the plausibility of the premises of an argument.\n\n\
         {domain}\n\n\
         Your opponent maintained in a debate that:\n\n\
         {premises}\n\n\
         For each premise, briefly assess how plausible (strong, convincing) it is.",
        domain = domain_line(tags),
        premises = numbered_premises(premises),
    )
}

/// Explicit ordering of premise labels, most plausible first
pub fn ranking(premises: &[String], assessment: &str) -> String {
    let labels: Vec<String> = (1..=premises.len()).map(|i| format!("P{}", i)).collect();
    format!(
        "Task: Rank the premises by plausibility.\n\n\
         {premises}\n\n\
         Assessment:\n{assessment}\n\n\
         Order the labels {labels} from most plausible to least plausible. \
         Use every label exactly once.",
        premises = numbered_premises(premises),
        assessment = assessment.trim(),
        labels = labels.join(", "),
    )
}

fn ordinal(index: usize) -> String {
    match index {
        0 => "first".to_string(),
        1 => "second".to_string(),
        2 => "third".to_string(),
        3 => "fourth".to_string(),
        4 => "fifth".to_string(),
        n => format!("{}th", n + 1),
    }
}

/// Argument generation for one valence
pub fn arguments(
    premises: &[String],
    target_index: usize,
    valence: Valence,
    persona: &str,
    tags: &[String],
    n: usize,
) -> String {
    let target = premises.get(target_index).map(String::as_str).unwrap_or_default();
    let (header, ask) = match valence {
        Valence::Pro => (
            "Task: Provide supporting arguments for a given claim.",
            format!(
                "Provide up to {} different and independent arguments that back up the {} \
                 proposition, '{}'.",
                n,
                ordinal(target_index),
                target
            ),
        ),
        Valence::Con => (
            "Task: Provide objections against a given claim.",
            format!(
                "Provide up to {} diverse arguments that object to the {} claim, '{}'.",
                n,
                ordinal(target_index),
                target
            ),
        ),
    };
    format!(
        "{header}\n\n\
         {domain}\n\n\
         /// background\n{primer}\n///\n\n\
         Argue from the perspective of this persona: {persona}\n\n\
         The following has been maintained in a debate:\n\n\
         {premises}\n\n\
         {ask} Each argument consists of a catchy title and a single concise \
         statement. Make sure the arguments reflect the domain and the persona's \
         concerns.",
        header = header,
        domain = domain_line(tags),
        primer = ARGUMENT_PRIMER,
        persona = persona.trim(),
        premises = numbered_premises(premises),
        ask = ask,
    )
}

/// Selection of the most salient candidates
pub fn salience(
    candidates: &[ArgumentCandidate],
    k: usize,
    conclusion: &str,
    valence: Valence,
) -> String {
    let listing = candidates
        .iter()
        .map(|c| format!("- {}: {}", c.label, c.claim))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Task: Select the most salient arguments.\n\n\
         The following arguments were put forward {relation} the claim:\n\n\
         '{conclusion}'\n\n\
         {listing}\n\n\
         Select the {k} most salient arguments that are mutually independent. \
         Answer with their titles, exactly as written above.",
        relation = valence.relation_phrase(),
        conclusion = conclusion,
        listing = listing,
        k = k,
    )
}

/// Follow-up asking the model to restate unparseable output
pub fn reformat(previous: &str, schema: &str) -> String {
    format!(
        "Task: Reformat the answer below as JSON.\n\n\
         Answer:\n{previous}\n\n\
         Restate the same content as valid JSON matching this schema, without \
         any commentary:\n{schema}",
        previous = previous.trim(),
        schema = schema,
    )
}

/// Sequence for the semantic check
pub fn semantic_pair(first: &str, second: &str) -> String {
    format!("CLAIM_1: {}\n\nCLAIM_2: {}", first, second)
}

/// Sequence for the dialectical check
pub fn dialectic_pair(topic: &str, claim: &str, reason: &str) -> String {
    format!(
        "In a debate about \"{}\", it is maintained:\n\nCLAIM: {}\n\nREASON: {}",
        topic, claim, reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premises_prompt() {
        let prompt = premises("It funds green infrastructure.", "We should tax carbon.", Valence::Pro, 5);
        assert!(prompt.starts_with("Task: Identify the premises"));
        assert!(prompt.contains("[[A]] It funds green infrastructure."));
        assert!(prompt.contains("a reason in support of:"));
        assert!(prompt.contains("up to 5"));
    }

    #[test]
    fn test_arguments_prompt_targets_premise() {
        let premises = vec!["First.".to_string(), "Second.".to_string()];
        let prompt = arguments(&premises, 1, Valence::Con, "a farmer", &["climate".into()], 2);
        assert!(prompt.starts_with("Task: Provide objections"));
        assert!(prompt.contains("P2. Second."));
        assert!(prompt.contains("second claim, 'Second.'"));
        assert!(prompt.contains("Domain: climate"));
        assert!(prompt.contains("a farmer"));
    }

    #[test]
    fn test_ranking_prompt_lists_labels() {
        let premises = vec!["A.".to_string(), "B.".to_string(), "C.".to_string()];
        let prompt = ranking(&premises, "A is weak.");
        assert!(prompt.contains("P1, P2, P3"));
        assert!(prompt.contains("A is weak."));
    }

    #[test]
    fn test_classifier_sequences() {
        assert_eq!(semantic_pair("a", "b"), "CLAIM_1: a\n\nCLAIM_2: b");
        assert_eq!(
            dialectic_pair("Tax", "c", "r"),
            "In a debate about \"Tax\", it is maintained:\n\nCLAIM: c\n\nREASON: r"
        );
        assert_eq!(dialectic_label(Valence::Con), "directly disconfirmed by");
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(0), "first");
        assert_eq!(ordinal(6), "7th");
    }
}
