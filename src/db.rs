use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::info;

use crate::config::Config;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

pub fn open_pool(config: &Config) -> anyhow::Result<DbPool> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let manager = SqliteConnectionManager::file(&config.db_path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))
    });

    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size.max(1))
        .build(manager)?;

    {
        let conn = pool.get()?;
        migrate(&conn)?;
    }

    info!(
        "database ready at {} (pool max_size={})",
        config.db_path.display(),
        config.pool_size.max(1)
    );

    Ok(pool)
}

pub fn migrate(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS membre_administratif(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nom TEXT NOT NULL,
            prenom TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            mot_de_passe TEXT NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('Admin', 'Secrétaire', 'Enseignant'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions(
            id TEXT PRIMARY KEY,
            member_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            FOREIGN KEY(member_id) REFERENCES membre_administratif(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_member ON sessions(member_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS filiere(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            nom TEXT,
            mention TEXT,
            domaine TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grade(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nom TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS annee_academique(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            annee TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS annee_etude(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            niveau INTEGER NOT NULL,
            filiere_id INTEGER,
            grade_id INTEGER,
            FOREIGN KEY(filiere_id) REFERENCES filiere(id),
            FOREIGN KEY(grade_id) REFERENCES grade(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_annee_etude_filiere ON annee_etude(filiere_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_annee_etude_grade ON annee_etude(grade_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS enseignant(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nom TEXT NOT NULL,
            prenom TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            telephone TEXT,
            specialite TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ue(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            nom TEXT NOT NULL,
            annee_etude_id INTEGER,
            credit INTEGER NOT NULL,
            semestre INTEGER NOT NULL,
            FOREIGN KEY(annee_etude_id) REFERENCES annee_etude(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ue_annee_etude ON ue(annee_etude_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ecue(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            nom TEXT NOT NULL,
            ue_id INTEGER,
            enseignant_id INTEGER,
            FOREIGN KEY(ue_id) REFERENCES ue(id),
            FOREIGN KEY(enseignant_id) REFERENCES enseignant(id)
        )",
        [],
    )?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_ecue_ue ON ecue(ue_id)", [])?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ecue_enseignant ON ecue(enseignant_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS etudiant(
            matricule TEXT PRIMARY KEY,
            nom TEXT NOT NULL,
            prenom TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            date_naissance TEXT NOT NULL,
            sexe TEXT NOT NULL,
            telephone TEXT NOT NULL,
            code TEXT NOT NULL
        )",
        [],
    )?;
    // Databases created before study level tracking lack this column.
    ensure_etudiant_niveau(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS parcours_etudiant(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            etudiant_matricule TEXT NOT NULL,
            annee_etude_id INTEGER NOT NULL,
            annee_academique_id INTEGER NOT NULL,
            semestre INTEGER NOT NULL,
            FOREIGN KEY(etudiant_matricule) REFERENCES etudiant(matricule),
            FOREIGN KEY(annee_etude_id) REFERENCES annee_etude(id),
            FOREIGN KEY(annee_academique_id) REFERENCES annee_academique(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_parcours_etudiant ON parcours_etudiant(etudiant_matricule)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_parcours_lookup
         ON parcours_etudiant(annee_etude_id, annee_academique_id, semestre)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS note(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ecue_id INTEGER NOT NULL,
            parcours_etudiant_id INTEGER NOT NULL,
            note REAL NOT NULL,
            FOREIGN KEY(ecue_id) REFERENCES ecue(id),
            FOREIGN KEY(parcours_etudiant_id) REFERENCES parcours_etudiant(id)
        )",
        [],
    )?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_note_ecue ON note(ecue_id)", [])?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_note_parcours ON note(parcours_etudiant_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS moyenne_ue(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            etudiant_matricule TEXT NOT NULL,
            ue_id INTEGER NOT NULL,
            annee_academique_id INTEGER NOT NULL,
            moyenne REAL NOT NULL,
            verdict TEXT NOT NULL,
            FOREIGN KEY(etudiant_matricule) REFERENCES etudiant(matricule),
            FOREIGN KEY(ue_id) REFERENCES ue(id),
            FOREIGN KEY(annee_academique_id) REFERENCES annee_academique(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_moyenne_ue_etudiant ON moyenne_ue(etudiant_matricule)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_moyenne_ue_ue ON moyenne_ue(ue_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_moyenne_ue_annee ON moyenne_ue(annee_academique_id)",
        [],
    )?;

    Ok(())
}

fn ensure_etudiant_niveau(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "etudiant", "niveau")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE etudiant ADD COLUMN niveau TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let cols = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cols.iter().any(|c| c == column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent_and_adds_niveau() {
        let conn = Connection::open_in_memory().expect("open memory db");
        migrate(&conn).expect("first migration");
        migrate(&conn).expect("second migration");
        assert!(table_has_column(&conn, "etudiant", "niveau").expect("table_info"));
    }

    #[test]
    fn legacy_etudiant_table_gets_niveau_column() {
        let conn = Connection::open_in_memory().expect("open memory db");
        conn.execute(
            "CREATE TABLE etudiant(
                matricule TEXT PRIMARY KEY,
                nom TEXT NOT NULL,
                prenom TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                date_naissance TEXT NOT NULL,
                sexe TEXT NOT NULL,
                telephone TEXT NOT NULL,
                code TEXT NOT NULL
            )",
            [],
        )
        .expect("legacy table");
        conn.execute(
            "INSERT INTO etudiant VALUES('E1', 'Kone', 'Awa', 'awa@example.org', '2001-02-03', 'F', '0102', 'X1')",
            [],
        )
        .expect("legacy row");

        migrate(&conn).expect("migration");

        let niveau: Option<String> = conn
            .query_row("SELECT niveau FROM etudiant WHERE matricule = 'E1'", [], |r| {
                r.get(0)
            })
            .expect("row survives");
        assert_eq!(niveau, None);
    }
}
