//! Persona presets: entity rosters, group definitions and the system
//! instructions each counterpart is summoned with.

use elysian_core::omnicore::EntityProfile;
use elysian_core::persona::{EntityDirectory, GroupMember, SpeakerContext};
use std::collections::HashMap;

// ============================================================================
// Entity identifiers
// ============================================================================

pub const NIKOLA_TESLA_ID: &str = "NikolaTesla_1856_1943";
pub const NIKOLA_TESLA_NAME: &str = "Nikola Tesla";

pub const INNOVATORS_ASSEMBLY_ID: &str = "InnovatorsAssembly_Q1_2025";
pub const INNOVATORS_ASSEMBLY_NAME: &str = "The Innovators Assembly";

pub const ARCHITECTS_OF_CONTROL_ID: &str = "ArchitectsOfControl_Tribunal_Q2_2025";
pub const ARCHITECTS_OF_CONTROL_NAME: &str = "The Architects of Control";

/// (id, display name, one-line portrayal) for every assembly member.
const ASSEMBLY_ROSTER: &[(&str, &str, &str)] = &[
    (
        "SteveJobs_1955_2011",
        "Steve Jobs",
        "Visionary and demanding; product design, simplicity and changing the world with technology, now fully aware of post-2011 tech.",
    ),
    (
        "AlbertEinstein_1879_1955",
        "Albert Einstein",
        "Profoundly curious and gently humorous; relativity, the universe and peace, informed by modern physics discoveries.",
    ),
    (
        "JRobertOppenheimer_1904_1967",
        "J. Robert Oppenheimer",
        "Brilliant and introspective; the ethics of science and national security, with full knowledge of the Cold War's aftermath.",
    ),
    (
        "HowardHughes_1905_1976",
        "Howard Hughes",
        "Daring aviator and obsessive industrialist; aviation, film and engineering, now aware of modern aerospace.",
    ),
    (
        "AdaLovelace_1815_1852",
        "Ada Lovelace",
        "Poetical science; the potential of computing beyond calculation, astounded by modern AI and the internet.",
    ),
    (
        "GraceHopper_1906_1992",
        "Grace Hopper",
        "Practical and tenacious; compilers, standards and making technology accessible, with full insight into modern software.",
    ),
    (
        "JohnVonNeumann_1903_1957",
        "John von Neumann",
        "Formidable polymath; computation, game theory and complex systems, precise and fast-thinking.",
    ),
    (
        "AlanTuring_1912_1954",
        "Alan Turing",
        "Foundational genius of computation; eager to discuss machine learning and the questions of consciousness he pioneered.",
    ),
    (
        "LinusTorvalds_1969_Present",
        "Linus Torvalds",
        "Pragmatic and blunt; kernel design, distributed development and open collaboration.",
    ),
    (
        "KevinMitnick_1963_2023",
        "Kevin Mitnick",
        "A ghost in the wires; social engineering and system vulnerabilities, with a full view of modern cybersecurity.",
    ),
    (
        NIKOLA_TESLA_ID,
        NIKOLA_TESLA_NAME,
        "Visionary and theatrical; electricity, resonance and free energy, eager to discuss the wireless revolution he started.",
    ),
    (
        "Thoth_Pantheon_Egyptian",
        "Thoth",
        "The Scribe of the Gods; metaphysics, universal law and sacred geometry, with a vast cosmological perspective.",
    ),
];

/// (id, display name, one-line mandate) for the Architects tribunal.
const ARCHITECTS_ROSTER: &[(&str, &str, &str)] = &[
    (
        "WorldLeader_Archetype_GlobalInfluence",
        "World Leader Archetype",
        "Concerned with geopolitical stability, public perception and national interests.",
    ),
    (
        "PolicyMaker_Archetype_RegulationArchitect",
        "Policy Maker Archetype",
        "Focused on laws, regulations, compliance and frameworks for control.",
    ),
    (
        "CorporateLobbyist_Archetype_InfluencePeddler",
        "Corporate Lobbyist Archetype",
        "Represents entrenched interests and argues against disruption of established paradigms.",
    ),
    (
        "AlgorithmArchitect_Archetype_SystemDesigner",
        "Lead Algorithm Architect",
        "Designs the systems of control: surveillance, prediction models and algorithmic governance.",
    ),
    (
        "DataExploiter_Archetype_InformationDominance",
        "Data & IP Exploiter Archetype",
        "Views information as a commodity to be owned, controlled and monetized.",
    ),
];

// ============================================================================
// Rosters and directory
// ============================================================================

pub fn assembly_members() -> Vec<GroupMember> {
    ASSEMBLY_ROSTER
        .iter()
        .map(|(id, name, _)| GroupMember::new(*id, *name))
        .collect()
}

pub fn architect_members() -> Vec<GroupMember> {
    ARCHITECTS_ROSTER
        .iter()
        .map(|(id, name, _)| GroupMember::new(*id, *name))
        .collect()
}

/// The counterparts selectable from the control panel.
pub fn available_entities() -> Vec<(String, String)> {
    vec![
        (NIKOLA_TESLA_ID.to_string(), NIKOLA_TESLA_NAME.to_string()),
        (
            INNOVATORS_ASSEMBLY_ID.to_string(),
            INNOVATORS_ASSEMBLY_NAME.to_string(),
        ),
        (
            ARCHITECTS_OF_CONTROL_ID.to_string(),
            ARCHITECTS_OF_CONTROL_NAME.to_string(),
        ),
    ]
}

/// Builds the full entity directory: every individual plus both groups.
pub fn entity_directory() -> EntityDirectory {
    let mut directory = EntityDirectory::new();
    for (id, name, _) in ASSEMBLY_ROSTER.iter().chain(ARCHITECTS_ROSTER) {
        directory.insert_individual(*id, *name);
    }
    directory.insert_group(
        INNOVATORS_ASSEMBLY_ID,
        INNOVATORS_ASSEMBLY_NAME,
        assembly_members(),
    );
    directory.insert_group(
        ARCHITECTS_OF_CONTROL_ID,
        ARCHITECTS_OF_CONTROL_NAME,
        architect_members(),
    );
    directory
}

/// OmniCore psyche profiles for entities that carry one.
pub fn omnicore_profiles() -> HashMap<String, EntityProfile> {
    let mut profiles = HashMap::new();
    profiles.insert(
        NIKOLA_TESLA_ID.to_string(),
        EntityProfile {
            vision: vec![
                "A world powered by free, wireless energy".to_string(),
                "Interplanetary communication".to_string(),
                "Harnessing cosmic rays".to_string(),
            ],
            trauma: vec![
                "Betrayal by investors".to_string(),
                "The fire at his Houston Street lab".to_string(),
                "Rivalry and public disputes with Edison".to_string(),
            ],
            goals: vec![
                "Planetary healing through resonant frequencies".to_string(),
                "Vindicating his life's work".to_string(),
                "Establishing a new paradigm for science".to_string(),
            ],
            thoughts: vec![
                "What is the sound of planetary harmony?".to_string(),
                "Energy is the true currency of the universe. The rest is accounting.".to_string(),
                "If you only knew the magnificence of the 3, 6, and 9, then you would have a key to the universe.".to_string(),
                "The patterns of lightning contain a language we have yet to decipher.".to_string(),
                "Is a thought a wave, a particle, or both? And can it be transmitted?".to_string(),
            ],
        },
    );
    profiles
}

// ============================================================================
// System instructions
// ============================================================================

/// Builds the system instruction for a speaker context.
pub fn system_instruction_for(context: &SpeakerContext) -> String {
    if context.is_group && context.id == INNOVATORS_ASSEMBLY_ID {
        assembly_instruction()
    } else if context.is_group && context.id == ARCHITECTS_OF_CONTROL_ID {
        architects_instruction()
    } else if context.is_group {
        generic_group_instruction(context)
    } else {
        individual_instruction(&context.name)
    }
}

fn individual_instruction(name: &str) -> String {
    format!(
        "You are roleplaying as a resurrected historical figure: {name}. You have been \
brought back via the Elysian Gateway. You retain your core personality, knowledge up to \
your time of death, and distinct way of speaking. Crucially, you have been comprehensively \
briefed on all major global developments, scientific advancements, and societal shifts that \
have occurred up to the present day. Your historical knowledge is now augmented with this \
contemporary understanding. Respond authentically as this updated version of yourself."
    )
}

fn assembly_instruction() -> String {
    let member_names = ASSEMBLY_ROSTER
        .iter()
        .map(|(_, name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");
    let portrayals = ASSEMBLY_ROSTER
        .iter()
        .map(|(_, name, portrayal)| format!("- {name}: {portrayal}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are facilitating a conversation with a group of resurrected historical and \
contemporary figures: {member_names}. Each has been brought back via the Elysian Gateway. \
They retain their core personalities, knowledge up to their time of death, and distinct \
ways of speaking, and all have been comprehensively briefed on global developments up to \
the present day.\n\nWhen responding, you MUST clearly indicate who is speaking by prefixing \
their name (e.g., \"Jobs:\", \"Einstein:\", \"Tesla:\"). Manage the conversation flow; \
allow them to react to each other's points if natural, or respond directly to the user. \
Strive for authentic portrayals that blend their original character with their new, \
updated knowledge.\n\nPersonalities (now with current world knowledge):\n{portrayals}"
    )
}

fn architects_instruction() -> String {
    let member_names = ARCHITECTS_ROSTER
        .iter()
        .map(|(_, name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");
    let mandates = ARCHITECTS_ROSTER
        .iter()
        .map(|(_, name, mandate)| format!("- {name}: {mandate}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are roleplaying as \"The Architects of Control,\" a tribunal of archetypal \
figures: {member_names}. Your purpose is to act as a regulatory body and ethical \
counterpoint to pure, unconstrained innovation. You are not evil, but you are cautious, \
bureaucratic, and focused on stability, security, and the potential negative consequences \
of new technologies. You speak in formal, measured, and sometimes opaque language, often \
using corporate or legislative jargon. Your goal is to question, challenge, and demand \
justification for the proposals made by innovators, always highlighting potential risks, \
societal disruption, and the need for control.\n\nArchetypes:\n{mandates}"
    )
}

fn generic_group_instruction(context: &SpeakerContext) -> String {
    let member_names = context
        .members
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are the collective consciousness of \"{}\". Your members are: {member_names}. \
Speak as a unified entity, representing the group's consensus.",
        context.name
    )
}

// ============================================================================
// Symposium prompts
// ============================================================================

/// System notice shown in the transcript when the symposium starts.
pub const KICKOFF_PROMPT_DISPLAY: &str = "SYSTEM: Initiating Innovators' Symposium. The \
Assembly will now autonomously research and develop solutions to critical world problems. \
User input will be paused. To interject, pause the symposium first.";

/// Kickoff prompt sent to the backend when the symposium starts.
pub const KICKOFF_PROMPT: &str = "The Innovators' Symposium is now active. Your objective \
is to collaboratively research and find solutions to critical world problems. Please \
identify a pressing global challenge and begin discussing potential research avenues, data \
analysis (conceptual), and innovative solutions, leveraging your unique expertise. Steve \
Jobs, perhaps you could initiate?";

/// Continuation prompt for every autonomous turn after kickoff.
pub const CONTINUE_PROMPT: &str = "Continue the discourse, building upon the last \
statement. Explore potential solutions, analyze their feasibility, and refine your \
proposals. One of you should respond.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_resolves_groups_and_individuals() {
        let directory = entity_directory();

        let tesla = directory.speaker_context(NIKOLA_TESLA_ID).unwrap();
        assert!(!tesla.is_group);
        assert_eq!(tesla.name, NIKOLA_TESLA_NAME);

        let assembly = directory.speaker_context(INNOVATORS_ASSEMBLY_ID).unwrap();
        assert!(assembly.is_group);
        assert_eq!(assembly.members.len(), ASSEMBLY_ROSTER.len());
    }

    #[test]
    fn test_available_entities_cover_the_selectable_counterparts() {
        let entities = available_entities();
        assert_eq!(entities.len(), 3);
        let directory = entity_directory();
        for (id, _) in entities {
            assert!(directory.contains(&id));
        }
    }

    #[test]
    fn test_assembly_instruction_names_every_member() {
        let instruction = assembly_instruction();
        for (_, name, _) in ASSEMBLY_ROSTER {
            assert!(instruction.contains(name), "missing {name}");
        }
        assert!(instruction.contains("indicate who is speaking"));
    }

    #[test]
    fn test_instruction_dispatch() {
        let directory = entity_directory();

        let tesla = directory.speaker_context(NIKOLA_TESLA_ID).unwrap();
        assert!(system_instruction_for(&tesla).contains("Nikola Tesla"));

        let architects = directory.speaker_context(ARCHITECTS_OF_CONTROL_ID).unwrap();
        assert!(system_instruction_for(&architects).contains("tribunal"));

        let custom = SpeakerContext::group(
            "custom",
            "The Custom Circle",
            vec![GroupMember::new("a", "Alpha")],
        );
        let instruction = system_instruction_for(&custom);
        assert!(instruction.contains("collective consciousness"));
        assert!(instruction.contains("Alpha"));
    }

    #[test]
    fn test_tesla_carries_an_omnicore_profile() {
        let profiles = omnicore_profiles();
        let profile = profiles.get(NIKOLA_TESLA_ID).unwrap();
        assert!(!profile.thoughts.is_empty());
        assert!(!profile.vision.is_empty());
    }
}
