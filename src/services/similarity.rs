use std::collections::BTreeMap;

/// Minimum token length kept by the tokenizer
const MIN_TOKEN_LEN: usize = 2;

/// TF-IDF vectorizer over a small, per-call document set.
///
/// Text is lower-cased and split into runs of word characters; runs shorter
/// than two characters are dropped. Weights are raw term counts times a
/// smoothed idf, `ln((1 + n) / (1 + df)) + 1`, and every document vector is
/// L2-normalized so cosine similarity reduces to a dot product.
#[derive(Debug, Default)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct terms learned by the last fit
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Learns the vocabulary and idf weights from `documents`, replacing any
    /// previous fit, and returns one normalized dense vector per document.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Vec<Vec<f64>> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        // Sorted vocabulary keeps feature indices stable for a given document set
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&String> = tokens.iter().collect();
            seen.sort();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let n_documents = documents.len() as f64;
        self.idf = document_frequency
            .values()
            .map(|&df| ((1.0 + n_documents) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        self.vocabulary = document_frequency
            .into_keys()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();

        tokenized.iter().map(|tokens| self.vectorize(tokens)).collect()
    }

    fn vectorize(&self, tokens: &[String]) -> Vec<f64> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                vector[index] += 1.0;
            }
        }
        for (weight, idf) in vector.iter_mut().zip(&self.idf) {
            *weight *= idf;
        }

        let norm = vector.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.iter_mut() {
                *weight /= norm;
            }
        }
        vector
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Cosine similarity between two equal-length vectors; zero vectors score 0.0
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Scores how close a book's text is to the user's favorite books.
///
/// One scorer is owned by each ranking pass; the vectorizer is re-fitted on
/// every call because the document set changes with every book.
#[derive(Debug, Default)]
pub struct ContentScorer {
    vectorizer: TfidfVectorizer,
}

impl ContentScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum cosine similarity between `book_text` and any favorite, in [0, 1].
    ///
    /// Returns 0.0 when either side is empty or the texts share no usable terms.
    pub fn similarity<S: AsRef<str>>(&mut self, book_text: &str, favorite_texts: &[S]) -> f64 {
        if book_text.is_empty() || favorite_texts.is_empty() {
            return 0.0;
        }

        let mut documents: Vec<&str> = Vec::with_capacity(favorite_texts.len() + 1);
        documents.push(book_text);
        documents.extend(favorite_texts.iter().map(|t| t.as_ref()));

        let vectors = self.vectorizer.fit_transform(&documents);
        if self.vectorizer.vocabulary_size() == 0 {
            return 0.0;
        }

        let (book_vector, favorite_vectors) = match vectors.split_first() {
            Some(split) => split,
            None => return 0.0,
        };

        favorite_vectors
            .iter()
            .map(|favorite| cosine_similarity(book_vector, favorite))
            .fold(0.0_f64, f64::max)
            .clamp(0.0, 1.0)
    }
}
