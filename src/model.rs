// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

//! Snapshot data model: clubs, people and their binary trait.

use anyhow::{bail, Context};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

pub type ClubId = u32;
pub type PersonId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    R,
    B,
}

impl Trait {
    pub fn label(self) -> &'static str {
        match self {
            Trait::R => "R",
            Trait::B => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    #[serde(rename = "trait")]
    pub kind: Trait,
    #[serde(default)]
    pub clubs: Vec<ClubId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: ClubId,
    #[serde(default)]
    pub members: Vec<PersonId>,
}

/// Aggregate trait counts, as forwarded to the legend after each draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitCounts {
    pub r: usize,
    pub b: usize,
}

impl TraitCounts {
    pub fn total(&self) -> usize {
        self.r + self.b
    }

    fn add(&mut self, kind: Trait) {
        match kind {
            Trait::R => self.r += 1,
            Trait::B => self.b += 1,
        }
    }
}

// On-disk shape of a snapshot; the in-memory form adds a person index.
#[derive(Serialize, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    clubs: Vec<Club>,
    #[serde(default)]
    people: Vec<Person>,
}

/// Read-only view of one simulation step: ordered clubs and ordered people.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SnapshotDocument", into = "SnapshotDocument")]
pub struct Snapshot {
    clubs: Vec<Club>,
    people: Vec<Person>,
    person_index: HashMap<PersonId, usize>,
}

impl From<SnapshotDocument> for Snapshot {
    fn from(doc: SnapshotDocument) -> Self {
        Snapshot::new(doc.clubs, doc.people)
    }
}

impl From<Snapshot> for SnapshotDocument {
    fn from(snapshot: Snapshot) -> Self {
        SnapshotDocument {
            clubs: snapshot.clubs,
            people: snapshot.people,
        }
    }
}

impl Snapshot {
    pub fn new(clubs: Vec<Club>, people: Vec<Person>) -> Self {
        let person_index = people
            .iter()
            .enumerate()
            .map(|(i, person)| (person.id, i))
            .collect();
        Self {
            clubs,
            people,
            person_index,
        }
    }

    pub fn clubs(&self) -> &[Club] {
        &self.clubs
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.person_index.get(&id).map(|&i| &self.people[i])
    }

    pub fn club(&self, id: ClubId) -> Option<&Club> {
        self.clubs.iter().find(|club| club.id == id)
    }

    /// Members of `club` resolved against the person index. Unknown ids are skipped.
    pub fn members<'a>(&'a self, club: &'a Club) -> impl Iterator<Item = &'a Person> + 'a {
        club.members.iter().filter_map(move |&id| self.person(id))
    }

    pub fn trait_count(&self, club: &Club, kind: Trait) -> usize {
        self.members(club).filter(|person| person.kind == kind).count()
    }

    pub fn member_count(&self, club: &Club) -> usize {
        self.members(club).count()
    }

    pub fn club_counts(&self, club: &Club) -> TraitCounts {
        let mut counts = TraitCounts::default();
        for person in self.members(club) {
            counts.add(person.kind);
        }
        counts
    }

    /// Trait counts over the whole population, regardless of membership.
    pub fn trait_counts(&self) -> TraitCounts {
        let mut counts = TraitCounts::default();
        for person in &self.people {
            counts.add(person.kind);
        }
        counts
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut club_ids = HashSet::new();
        for club in &self.clubs {
            if !club_ids.insert(club.id) {
                bail!("Duplicate club id {}", club.id);
            }
        }
        if self.person_index.len() != self.people.len() {
            let mut seen = HashSet::new();
            for person in &self.people {
                if !seen.insert(person.id) {
                    bail!("Duplicate person id {}", person.id);
                }
            }
        }
        for club in &self.clubs {
            for member in &club.members {
                if !self.person_index.contains_key(member) {
                    bail!("Club {} lists unknown member {}", club.id, member);
                }
            }
        }
        for person in &self.people {
            for club in &person.clubs {
                if !club_ids.contains(club) {
                    bail!("Person {} belongs to unknown club {}", person.id, club);
                }
            }
        }
        Ok(())
    }

    pub fn load_from_disk(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&data)
            .with_context(|| format!("parsing snapshot {}", path.display()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn save_to_disk(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Builds a demo population. Each person joins `memberships` distinct clubs
    /// (capped at the club count) and carries trait `R` with probability `r_share`.
    pub fn random<R: Rng + ?Sized>(
        club_count: usize,
        people_count: usize,
        memberships: usize,
        r_share: f32,
        rng: &mut R,
    ) -> Self {
        let mut clubs: Vec<Club> = (1..=club_count as ClubId)
            .map(|id| Club {
                id,
                members: Vec::new(),
            })
            .collect();
        let per_person = memberships.min(club_count);
        let r_share = r_share.clamp(0.0, 1.0) as f64;

        let mut people = Vec::with_capacity(people_count);
        for id in 1..=people_count as PersonId {
            let kind = if rng.gen_bool(r_share) { Trait::R } else { Trait::B };
            let mut joined: Vec<usize> = index::sample(&mut *rng, club_count, per_person).into_vec();
            joined.sort_unstable();
            for &slot in &joined {
                clubs[slot].members.push(id);
            }
            people.push(Person {
                id,
                kind,
                clubs: joined.iter().map(|&slot| clubs[slot].id).collect(),
            });
        }

        Snapshot::new(clubs, people)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn person(id: PersonId, kind: Trait, clubs: &[ClubId]) -> Person {
        Person {
            id,
            kind,
            clubs: clubs.to_vec(),
        }
    }

    fn sample() -> Snapshot {
        Snapshot::new(
            vec![
                Club { id: 1, members: vec![1, 2, 3] },
                Club { id: 2, members: vec![3] },
            ],
            vec![
                person(1, Trait::R, &[1]),
                person(2, Trait::B, &[1]),
                person(3, Trait::R, &[1, 2]),
                person(4, Trait::B, &[]),
            ],
        )
    }

    #[test]
    fn counts_members_by_trait() {
        let snapshot = sample();
        let club = &snapshot.clubs()[0];
        assert_eq!(snapshot.trait_count(club, Trait::R), 2);
        assert_eq!(snapshot.trait_count(club, Trait::B), 1);
        assert_eq!(snapshot.member_count(club), 3);
        assert_eq!(snapshot.club_counts(club), TraitCounts { r: 2, b: 1 });
    }

    #[test]
    fn population_counts_include_unaffiliated_people() {
        assert_eq!(sample().trait_counts(), TraitCounts { r: 2, b: 2 });
    }

    #[test]
    fn parses_trait_field_from_json() {
        let json = r#"{
            "clubs": [{ "id": 7, "members": [1] }],
            "people": [{ "id": 1, "trait": "B", "clubs": [7] }]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.person(1).map(|p| p.kind), Some(Trait::B));
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_member() {
        let snapshot = Snapshot::new(vec![Club { id: 1, members: vec![9] }], vec![]);
        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("unknown member 9"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let clubs = Snapshot::new(
            vec![Club { id: 1, members: vec![] }, Club { id: 1, members: vec![] }],
            vec![],
        );
        assert!(clubs.validate().is_err());

        let people = Snapshot::new(
            vec![],
            vec![person(1, Trait::R, &[]), person(1, Trait::B, &[])],
        );
        assert!(people.validate().unwrap_err().to_string().contains("Duplicate person"));
    }

    #[test]
    fn random_population_is_consistent() {
        let mut rng = StdRng::seed_from_u64(3);
        let snapshot = Snapshot::random(5, 40, 2, 0.5, &mut rng);
        assert_eq!(snapshot.clubs().len(), 5);
        assert_eq!(snapshot.people().len(), 40);
        assert!(snapshot.validate().is_ok());
        for p in snapshot.people() {
            assert_eq!(p.clubs.len(), 2);
            for club_id in &p.clubs {
                let club = snapshot.club(*club_id).unwrap();
                assert!(club.members.contains(&p.id));
            }
        }
    }

    #[test]
    fn random_population_caps_memberships_at_club_count() {
        let mut rng = StdRng::seed_from_u64(11);
        let snapshot = Snapshot::random(2, 3, 5, 1.0, &mut rng);
        assert!(snapshot.people().iter().all(|p| p.clubs.len() == 2 && p.kind == Trait::R));
    }

    #[test]
    fn snapshot_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snapshot.json");
        sample().save_to_disk(&path).unwrap();
        let loaded = Snapshot::load_from_disk(&path).unwrap();
        assert_eq!(loaded.people(), sample().people());
        assert_eq!(loaded.person(3).map(|p| p.clubs.clone()), Some(vec![1, 2]));
    }
}
