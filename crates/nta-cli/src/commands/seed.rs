//! A small, hand-built lemma history for the name of Norway: Old Norse
//! *Nóregr* and its descendants, plus two competing etymology claims.

use nta_core::{
  ids,
  model::{Claim, Form, Lemma, Source, UNKNOWN_POS},
  repo::{LemmaRelation, Repository},
  store::GraphStore,
};
use tracing::info;

const CLAIM_TYPE: &str = "etymology";
const CLAIM_STATUS: &str = "PROPOSED";

/// `(language, headword)` of every seeded lemma.
const LEMMAS: &[(&str, &str)] = &[
  ("non", "Nóregr"),
  ("nn", "Noreg"),
  ("nb", "Norge"),
  ("da", "Norge"),
  ("en", "Norway"),
];

/// Lemmas that also get an attested form.
const FORMS: &[(&str, &str)] = &[
  ("non", "Nóregr"),
  ("nn", "Noreg"),
  ("nb", "Norge"),
  ("en", "Norway"),
];

const HISTORY: &[((&str, &str), LemmaRelation, (&str, &str))] = &[
  (("nn", "Noreg"), LemmaRelation::DerivesFrom, ("non", "Nóregr")),
  (("nb", "Norge"), LemmaRelation::DerivesFrom, ("da", "Norge")),
  (("da", "Norge"), LemmaRelation::DerivesFrom, ("non", "Nóregr")),
  (("en", "Norway"), LemmaRelation::BorrowedFrom, ("non", "Nóregr")),
];

/// `(citekey, title, statement)` for each competing hypothesis.
const HYPOTHESES: &[(&str, &str, &str)] = &[
  (
    "placeholder_nord_vegr",
    "Placeholder source for norð + vegr hypothesis",
    "Nóregr derives from norð + vegr",
  ),
  (
    "placeholder_nor_vegr",
    "Placeholder source for nór + vegr hypothesis",
    "Nóregr derives from nór + vegr",
  ),
];

/// Seeded lemma ids are kept readable: `<language>:<headword>`.
pub fn seed_lemma_id(language: &str, headword: &str) -> String {
  format!("{language}:{headword}")
}

pub async fn seed_norway<S: GraphStore>(repo: &Repository<'_, S>) -> nta_core::Result<()> {
  for &(language, headword) in LEMMAS {
    repo
      .upsert_lemma(&Lemma {
        lemma_id: seed_lemma_id(language, headword),
        headword: headword.to_owned(),
        language: language.to_owned(),
        pos:      Some(UNKNOWN_POS.to_owned()),
      })
      .await?;
  }

  for &(language, orthography) in FORMS {
    let form = Form {
      form_id:     ids::form_id(language, orthography),
      orthography: orthography.to_owned(),
      language:    language.to_owned(),
    };
    repo.upsert_form(&form).await?;
    repo
      .link_form_lemma(&form.form_id, &seed_lemma_id(language, orthography))
      .await?;
  }

  for &((from_lang, from_head), relation, (to_lang, to_head)) in HISTORY {
    repo
      .link_lemma_history(
        &seed_lemma_id(from_lang, from_head),
        relation,
        &seed_lemma_id(to_lang, to_head),
      )
      .await?;
  }

  let target = seed_lemma_id("non", "Nóregr");
  let mut claim_ids = Vec::with_capacity(HYPOTHESES.len());
  for &(citekey, title, statement) in HYPOTHESES {
    let source = Source {
      source_id: ids::source_id(citekey),
      citekey:   citekey.to_owned(),
      title:     title.to_owned(),
      year:      None,
      authors:   None,
      url:       None,
    };
    let claim = Claim {
      claim_id:   ids::claim_id(CLAIM_TYPE, &target, statement, &source.source_id),
      claim_type: CLAIM_TYPE.to_owned(),
      statement:  statement.to_owned(),
      confidence: Some(0.5),
      status:     Some(CLAIM_STATUS.to_owned()),
    };

    repo.upsert_source(&source).await?;
    repo.upsert_claim(&claim).await?;
    repo.link_claim_asserts_lemma(&claim.claim_id, &target).await?;
    repo
      .link_claim_supported_by(&claim.claim_id, &source.source_id)
      .await?;
    claim_ids.push(claim.claim_id);
  }

  if let [a, b] = claim_ids.as_slice() {
    repo.link_claim_contradicts(a, b).await?;
    repo.link_claim_contradicts(b, a).await?;
  }

  info!(lemmas = LEMMAS.len(), claims = claim_ids.len(), "seeded Norway example");
  Ok(())
}
