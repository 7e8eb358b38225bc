//! Every table served under `/api/<path>`, described once.

use super::resource::{
    Dependent, Field, FieldKind, ForeignKey, Key, KeyKind, Messages, Resource, Unique,
};

pub const ROLES: &[&str] = &["Admin", "Secrétaire", "Enseignant"];

const ID: Key = Key {
    column: "id",
    kind: KeyKind::Generated,
};

const fn french(
    not_found: &'static str,
    created: &'static str,
    updated: &'static str,
    deleted: &'static str,
) -> Messages {
    Messages {
        not_found,
        created,
        updated,
        deleted,
        missing_field: "Champs obligatoires manquants",
        no_fields: "Aucun champ à mettre à jour",
        invalid_choice: "Valeur non autorisée",
    }
}

const fn english(
    not_found: &'static str,
    created: &'static str,
    updated: &'static str,
    deleted: &'static str,
) -> Messages {
    Messages {
        not_found,
        created,
        updated,
        deleted,
        missing_field: "Missing required fields",
        no_fields: "No fields to update",
        invalid_choice: "Invalid value",
    }
}

pub static MEMBERS: Resource = Resource {
    path: "membres_administratifs",
    table: "membre_administratif",
    key: ID,
    fields: &[
        Field::required("nom", FieldKind::Text),
        Field::required("prenom", FieldKind::Text),
        Field::required("email", FieldKind::Text),
        Field::required("mot_de_passe", FieldKind::Password),
        Field::required("role", FieldKind::Choice(ROLES)),
    ],
    select: "SELECT id, nom, prenom, email, role FROM membre_administratif",
    select_key: "id",
    unique: &[Unique {
        column: "email",
        on_create: "Email already exists",
        on_update: "Another member with this email already exists",
    }],
    foreign_keys: &[],
    // sessions cascade with the member
    dependents: &[],
    messages: Messages {
        not_found: "Membre administratif not found",
        created: "Membre administratif created successfully",
        updated: "Membre administratif updated successfully",
        deleted: "Membre administratif deleted successfully",
        missing_field: "Missing required field: {field}",
        no_fields: "No fields to update",
        invalid_choice: "Invalid role",
    },
    requires_session: true,
};

pub static FILIERES: Resource = Resource {
    path: "filieres",
    table: "filiere",
    key: ID,
    fields: &[
        Field::required("code", FieldKind::Text),
        Field::optional("nom", FieldKind::Text),
        Field::optional("mention", FieldKind::Text),
        Field::required("domaine", FieldKind::Text),
    ],
    select: "SELECT id, code, nom, mention, domaine FROM filiere",
    select_key: "id",
    unique: &[Unique {
        column: "code",
        on_create: "Filiere with this code already exists",
        on_update: "Another filiere with this code already exists",
    }],
    foreign_keys: &[],
    dependents: &[Dependent {
        table: "annee_etude",
        column: "filiere_id",
        message: "Cannot delete filiere with related annee_etude records",
    }],
    messages: english(
        "Filiere not found",
        "Filiere created successfully",
        "Filiere updated successfully",
        "Filiere deleted successfully",
    ),
    requires_session: false,
};

pub static GRADES: Resource = Resource {
    path: "grades",
    table: "grade",
    key: ID,
    fields: &[Field::required("nom", FieldKind::Text)],
    select: "SELECT id, nom FROM grade",
    select_key: "id",
    unique: &[Unique {
        column: "nom",
        on_create: "Grade with this name already exists",
        on_update: "Another grade with this name already exists",
    }],
    foreign_keys: &[],
    dependents: &[Dependent {
        table: "annee_etude",
        column: "grade_id",
        message: "Cannot delete grade with related annee_etude records",
    }],
    messages: english(
        "Grade not found",
        "Grade created successfully",
        "Grade updated successfully",
        "Grade deleted successfully",
    ),
    requires_session: false,
};

pub static ACADEMIC_YEARS: Resource = Resource {
    path: "annees-academiques",
    table: "annee_academique",
    key: ID,
    fields: &[Field::required("annee", FieldKind::Text)],
    select: "SELECT id, annee FROM annee_academique",
    select_key: "id",
    unique: &[Unique {
        column: "annee",
        on_create: "Academic year already exists",
        on_update: "Another academic year with this value already exists",
    }],
    foreign_keys: &[],
    dependents: &[
        Dependent {
            table: "parcours_etudiant",
            column: "annee_academique_id",
            message: "Cannot delete academic year with related parcours_etudiant records",
        },
        Dependent {
            table: "moyenne_ue",
            column: "annee_academique_id",
            message: "Cannot delete academic year with related moyenne_ue records",
        },
    ],
    messages: english(
        "Academic year not found",
        "Academic year created successfully",
        "Academic year updated successfully",
        "Academic year deleted successfully",
    ),
    requires_session: false,
};

pub static STUDY_YEARS: Resource = Resource {
    path: "annees-etude",
    table: "annee_etude",
    key: ID,
    fields: &[
        Field::required("code", FieldKind::Text),
        Field::required("niveau", FieldKind::Integer),
        Field::optional("filiere_id", FieldKind::Integer),
        Field::optional("grade_id", FieldKind::Integer),
    ],
    select: "SELECT ae.id, ae.code, ae.niveau, ae.filiere_id, ae.grade_id,
                    f.code AS filiere_code, f.nom AS filiere_nom, g.nom AS grade_nom
             FROM annee_etude ae
             LEFT JOIN filiere f ON ae.filiere_id = f.id
             LEFT JOIN grade g ON ae.grade_id = g.id",
    select_key: "ae.id",
    unique: &[Unique {
        column: "code",
        on_create: "Study year with this code already exists",
        on_update: "Another study year with this code already exists",
    }],
    foreign_keys: &[
        ForeignKey {
            column: "filiere_id",
            table: "filiere",
            references: "id",
            message: "Referenced filiere not found",
        },
        ForeignKey {
            column: "grade_id",
            table: "grade",
            references: "id",
            message: "Referenced grade not found",
        },
    ],
    dependents: &[
        Dependent {
            table: "ue",
            column: "annee_etude_id",
            message: "Cannot delete study year with related ue records",
        },
        Dependent {
            table: "parcours_etudiant",
            column: "annee_etude_id",
            message: "Cannot delete study year with related parcours_etudiant records",
        },
    ],
    messages: english(
        "Study year not found",
        "Study year created successfully",
        "Study year updated successfully",
        "Study year deleted successfully",
    ),
    requires_session: false,
};

pub static UES: Resource = Resource {
    path: "ue",
    table: "ue",
    key: ID,
    fields: &[
        Field::required("code", FieldKind::Text),
        Field::required("nom", FieldKind::Text),
        Field::optional("annee_etude_id", FieldKind::Integer),
        Field::required("credit", FieldKind::Integer),
        Field::required("semestre", FieldKind::Integer),
    ],
    select: "SELECT u.id, u.code, u.nom, u.annee_etude_id, u.credit, u.semestre,
                    ae.code AS annee_etude_code
             FROM ue u
             LEFT JOIN annee_etude ae ON u.annee_etude_id = ae.id",
    select_key: "u.id",
    unique: &[Unique {
        column: "code",
        on_create: "Une UE avec ce code existe déjà",
        on_update: "Une autre UE utilise déjà ce code",
    }],
    foreign_keys: &[ForeignKey {
        column: "annee_etude_id",
        table: "annee_etude",
        references: "id",
        message: "Année d'étude référencée non trouvée",
    }],
    dependents: &[
        Dependent {
            table: "ecue",
            column: "ue_id",
            message: "Impossible de supprimer une UE qui possède des ECUE",
        },
        Dependent {
            table: "moyenne_ue",
            column: "ue_id",
            message: "Impossible de supprimer une UE qui possède des moyennes",
        },
    ],
    messages: french(
        "UE non trouvée",
        "UE créée avec succès",
        "UE mise à jour avec succès",
        "UE supprimée avec succès",
    ),
    requires_session: false,
};

pub static ECUES: Resource = Resource {
    path: "ecues",
    table: "ecue",
    key: ID,
    fields: &[
        Field::required("code", FieldKind::Text),
        Field::required("nom", FieldKind::Text),
        Field::optional("ue_id", FieldKind::Integer),
        Field::optional("enseignant_id", FieldKind::Integer),
    ],
    select: "SELECT ec.id, ec.code, ec.nom, ec.ue_id, ec.enseignant_id,
                    u.nom AS ue_nom, en.nom AS enseignant_nom, en.prenom AS enseignant_prenom
             FROM ecue ec
             LEFT JOIN ue u ON ec.ue_id = u.id
             LEFT JOIN enseignant en ON ec.enseignant_id = en.id",
    select_key: "ec.id",
    unique: &[Unique {
        column: "code",
        on_create: "Un ECUE avec ce code existe déjà",
        on_update: "Un autre ECUE utilise déjà ce code",
    }],
    foreign_keys: &[
        ForeignKey {
            column: "ue_id",
            table: "ue",
            references: "id",
            message: "UE référencée non trouvée",
        },
        ForeignKey {
            column: "enseignant_id",
            table: "enseignant",
            references: "id",
            message: "Enseignant référencé non trouvé",
        },
    ],
    dependents: &[Dependent {
        table: "note",
        column: "ecue_id",
        message: "Impossible de supprimer un ECUE qui possède des notes",
    }],
    messages: french(
        "ECUE non trouvé",
        "ECUE créé avec succès",
        "ECUE mis à jour avec succès",
        "ECUE supprimé avec succès",
    ),
    requires_session: false,
};

pub static STUDENTS: Resource = Resource {
    path: "etudiants",
    table: "etudiant",
    key: Key {
        column: "matricule",
        kind: KeyKind::Natural,
    },
    fields: &[
        Field::required("nom", FieldKind::Text),
        Field::required("prenom", FieldKind::Text),
        Field::required("email", FieldKind::Text),
        Field::required("date_naissance", FieldKind::Date),
        Field::create_only("sexe", FieldKind::Text),
        Field::create_only("telephone", FieldKind::Text),
        // Access code checked by student login.
        Field::create_only("code", FieldKind::Text),
        Field::optional("niveau", FieldKind::Text),
    ],
    select: "SELECT matricule, nom, prenom, email, date_naissance, sexe, telephone, code, niveau
             FROM etudiant",
    select_key: "matricule",
    unique: &[
        Unique {
            column: "matricule",
            on_create: "Un étudiant avec ce matricule existe déjà",
            on_update: "Un autre étudiant utilise déjà ce matricule",
        },
        Unique {
            column: "email",
            on_create: "Un étudiant avec cet email existe déjà",
            on_update: "Un autre étudiant utilise déjà cet email",
        },
    ],
    foreign_keys: &[],
    dependents: &[
        Dependent {
            table: "parcours_etudiant",
            column: "etudiant_matricule",
            message: "Impossible de supprimer - étudiant référencé dans parcours_etudiant",
        },
        Dependent {
            table: "moyenne_ue",
            column: "etudiant_matricule",
            message: "Impossible de supprimer - étudiant référencé dans moyenne_ue",
        },
    ],
    messages: french(
        "Étudiant non trouvé",
        "Étudiant créé avec succès",
        "Étudiant mis à jour avec succès",
        "Étudiant supprimé avec succès",
    ),
    requires_session: false,
};

pub static TEACHERS: Resource = Resource {
    path: "enseignant",
    table: "enseignant",
    key: ID,
    fields: &[
        Field::required("nom", FieldKind::Text),
        Field::required("prenom", FieldKind::Text),
        Field::required("email", FieldKind::Text),
        Field::optional("telephone", FieldKind::Text),
        Field::required("specialite", FieldKind::Text),
    ],
    select: "SELECT id, nom, prenom, email, telephone, specialite FROM enseignant",
    select_key: "id",
    unique: &[Unique {
        column: "email",
        on_create: "Un enseignant avec cet email existe déjà",
        on_update: "Un autre enseignant utilise déjà cet email",
    }],
    foreign_keys: &[],
    dependents: &[Dependent {
        table: "ecue",
        column: "enseignant_id",
        message: "Impossible de supprimer un enseignant rattaché à des ECUE",
    }],
    messages: french(
        "Enseignant non trouvé",
        "Enseignant créé avec succès",
        "Enseignant mis à jour avec succès",
        "Enseignant supprimé avec succès",
    ),
    requires_session: false,
};

pub static PATHS: Resource = Resource {
    path: "parcours_etudiant",
    table: "parcours_etudiant",
    key: ID,
    fields: &[
        Field::required("etudiant_matricule", FieldKind::Text),
        Field::required("annee_etude_id", FieldKind::Integer),
        Field::required("annee_academique_id", FieldKind::Integer),
        Field::required("semestre", FieldKind::Integer),
    ],
    select: "SELECT p.id, p.etudiant_matricule, p.annee_etude_id, p.annee_academique_id, p.semestre,
                    et.nom AS etudiant_nom, et.prenom AS etudiant_prenom,
                    ae.code AS annee_etude_code, aa.annee AS annee_academique
             FROM parcours_etudiant p
             LEFT JOIN etudiant et ON p.etudiant_matricule = et.matricule
             LEFT JOIN annee_etude ae ON p.annee_etude_id = ae.id
             LEFT JOIN annee_academique aa ON p.annee_academique_id = aa.id",
    select_key: "p.id",
    unique: &[],
    foreign_keys: &[
        ForeignKey {
            column: "etudiant_matricule",
            table: "etudiant",
            references: "matricule",
            message: "Étudiant référencé non trouvé",
        },
        ForeignKey {
            column: "annee_etude_id",
            table: "annee_etude",
            references: "id",
            message: "Année d'étude référencée non trouvée",
        },
        ForeignKey {
            column: "annee_academique_id",
            table: "annee_academique",
            references: "id",
            message: "Année académique référencée non trouvée",
        },
    ],
    dependents: &[Dependent {
        table: "note",
        column: "parcours_etudiant_id",
        message: "Impossible de supprimer un parcours qui possède des notes",
    }],
    messages: french(
        "Parcours étudiant non trouvé",
        "Parcours étudiant créé avec succès",
        "Parcours étudiant mis à jour avec succès",
        "Parcours étudiant supprimé avec succès",
    ),
    requires_session: false,
};

pub static SCORES: Resource = Resource {
    path: "note",
    table: "note",
    key: ID,
    fields: &[
        Field::required("ecue_id", FieldKind::Integer),
        Field::required("parcours_etudiant_id", FieldKind::Integer),
        Field::required("note", FieldKind::Decimal),
    ],
    select: "SELECT n.id, n.ecue_id, n.parcours_etudiant_id, n.note,
                    p.etudiant_matricule, ec.nom AS ecue_nom
             FROM note n
             LEFT JOIN parcours_etudiant p ON n.parcours_etudiant_id = p.id
             LEFT JOIN ecue ec ON n.ecue_id = ec.id",
    select_key: "n.id",
    unique: &[],
    foreign_keys: &[
        ForeignKey {
            column: "ecue_id",
            table: "ecue",
            references: "id",
            message: "ECUE référencé non trouvé",
        },
        ForeignKey {
            column: "parcours_etudiant_id",
            table: "parcours_etudiant",
            references: "id",
            message: "Parcours étudiant référencé non trouvé",
        },
    ],
    dependents: &[],
    messages: french(
        "Note non trouvée",
        "Note créée avec succès",
        "Note mise à jour avec succès",
        "Note supprimée avec succès",
    ),
    requires_session: false,
};

pub static UE_AVERAGES: Resource = Resource {
    path: "moyenne_ue",
    table: "moyenne_ue",
    key: ID,
    fields: &[
        Field::required("etudiant_matricule", FieldKind::Text),
        Field::required("ue_id", FieldKind::Integer),
        Field::required("annee_academique_id", FieldKind::Integer),
        Field::required("moyenne", FieldKind::Decimal),
        Field::required("verdict", FieldKind::Text),
    ],
    select: "SELECT m.id, m.etudiant_matricule, m.ue_id, m.annee_academique_id, m.moyenne, m.verdict,
                    et.nom AS etudiant_nom, et.prenom AS etudiant_prenom,
                    u.nom AS ue_nom, aa.annee AS annee_academique
             FROM moyenne_ue m
             LEFT JOIN etudiant et ON m.etudiant_matricule = et.matricule
             LEFT JOIN ue u ON m.ue_id = u.id
             LEFT JOIN annee_academique aa ON m.annee_academique_id = aa.id",
    select_key: "m.id",
    unique: &[],
    foreign_keys: &[
        ForeignKey {
            column: "etudiant_matricule",
            table: "etudiant",
            references: "matricule",
            message: "Étudiant référencé non trouvé",
        },
        ForeignKey {
            column: "ue_id",
            table: "ue",
            references: "id",
            message: "UE référencée non trouvée",
        },
        ForeignKey {
            column: "annee_academique_id",
            table: "annee_academique",
            references: "id",
            message: "Année académique référencée non trouvée",
        },
    ],
    dependents: &[],
    messages: french(
        "Moyenne d'UE non trouvée",
        "Moyenne d'UE créée avec succès",
        "Moyenne d'UE mise à jour avec succès",
        "Moyenne d'UE supprimée avec succès",
    ),
    requires_session: false,
};

pub static RESOURCES: &[&Resource] = &[
    &MEMBERS,
    &FILIERES,
    &GRADES,
    &ACADEMIC_YEARS,
    &STUDY_YEARS,
    &UES,
    &ECUES,
    &STUDENTS,
    &TEACHERS,
    &PATHS,
    &SCORES,
    &UE_AVERAGES,
];
